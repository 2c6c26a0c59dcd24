use crate::column::{ColumnRef, TableContext};
use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::query::Query;
use crate::value::{BindValue, SqlValue};

use super::{CompareOp, Expr, ExprKind, LogicOp, MultiOp, MultiValues, Operand};

/// Settings inherited from the enclosing node while compiling.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub(crate) dialect: &'a dyn Dialect,
    pub(crate) ignore_case: bool,
    pub(crate) table: Option<&'a TableContext>,
    pub(crate) sources: &'a [TableContext],
}

impl<'a> Scope<'a> {
    pub(crate) const fn new(dialect: &'a dyn Dialect) -> Self {
        Self {
            dialect,
            ignore_case: false,
            table: None,
            sources: &[],
        }
    }
}

impl Expr {
    /// Appends this node's SQL to `sql` and its values to `binds`, in
    /// placeholder order.
    pub(crate) fn compile(
        &self,
        sql: &mut String,
        binds: &mut Vec<BindValue>,
        outer: &Scope<'_>,
    ) -> Result<()> {
        let scope = Scope {
            ignore_case: self.ignore_case.unwrap_or(outer.ignore_case),
            table: self.table.as_ref().or(outer.table),
            ..*outer
        };
        match &self.kind {
            ExprKind::Compare(target, op, operand) => {
                let column = target.resolve(scope.table, scope.sources)?;
                compile_compare(&column, *op, operand, sql, binds, &scope)
            }
            ExprKind::MultiValue(target, op, values) => {
                let column = target.resolve(scope.table, scope.sources)?;
                compile_multi(&column, *op, values, sql, binds, &scope)
            }
            ExprKind::Logic(op, children) => compile_logic(*op, children, sql, binds, &scope),
            ExprKind::Raw(raw) => {
                sql.push_str(raw);
                Ok(())
            }
        }
    }
}

fn compile_compare(
    column: &ColumnRef,
    op: CompareOp,
    operand: &Operand,
    sql: &mut String,
    binds: &mut Vec<BindValue>,
    scope: &Scope<'_>,
) -> Result<()> {
    let qualified = column.qualified_sql();
    match operand {
        Operand::Value(SqlValue::Null) => match op {
            CompareOp::Eq => sql.push_str(&format!("{qualified} IS NULL")),
            CompareOp::NotEq => sql.push_str(&format!("{qualified} IS NOT NULL")),
            _ => {
                return Err(CompileError::UnsupportedNullComparison {
                    column: qualified,
                    op: String::from(op.as_str()),
                })
            }
        },
        Operand::Value(value) => {
            if scope.ignore_case && column.is_text() {
                let dialect = scope.dialect;
                match dialect.ignore_case_operator(op) {
                    Some(folded) => sql.push_str(&format!("{qualified} {folded} ?")),
                    None => sql.push_str(&format!(
                        "{} {op} {}",
                        dialect.ignore_case(&qualified),
                        dialect.ignore_case("?")
                    )),
                }
            } else {
                sql.push_str(&format!("{qualified} {op} ?"));
            }
            binds.extend(BindValue::new(column.column_type(), value.clone()));
        }
        Operand::Raw(raw) => sql.push_str(&format!("{qualified} {op} {raw}")),
        Operand::SubQuery(query) => {
            let (sub_sql, sub_binds) = query.compile_nested(scope.dialect)?;
            sql.push_str(&format!("{qualified} {op} ({sub_sql})"));
            binds.extend(sub_binds);
        }
    }
    Ok(())
}

fn compile_multi(
    column: &ColumnRef,
    op: MultiOp,
    values: &MultiValues,
    sql: &mut String,
    binds: &mut Vec<BindValue>,
    scope: &Scope<'_>,
) -> Result<()> {
    let qualified = column.qualified_sql();
    match values {
        MultiValues::List(list) if list.is_empty() => sql.push_str(op.empty_set_sql()),
        MultiValues::List(list) => {
            if list.iter().any(SqlValue::is_null) {
                return Err(CompileError::UnsupportedNullComparison {
                    column: qualified,
                    op: String::from(op.as_str()),
                });
            }
            let placeholders = vec!["?"; list.len()].join(",");
            sql.push_str(&format!("{qualified} {} ({placeholders})", op.as_str()));
            binds.extend(
                list.iter()
                    .filter_map(|value| BindValue::new(column.column_type(), value.clone())),
            );
        }
        MultiValues::SubQuery(query) => {
            check_in_subquery(query, scope.dialect)?;
            let (sub_sql, sub_binds) = query.compile_nested(scope.dialect)?;
            sql.push_str(&format!("{qualified} {} ({sub_sql})", op.as_str()));
            binds.extend(sub_binds);
        }
    }
    Ok(())
}

fn check_in_subquery(query: &Query, dialect: &dyn Dialect) -> Result<()> {
    if query.has_limit_or_offset() && !dialect.supports_limit_in_in_subquery() {
        return Err(CompileError::DialectCapabilityMissing {
            dialect: dialect.name(),
            feature: "LIMIT inside an IN sub-query",
        });
    }
    Ok(())
}

fn compile_logic(
    op: LogicOp,
    children: &[Expr],
    sql: &mut String,
    binds: &mut Vec<BindValue>,
    scope: &Scope<'_>,
) -> Result<()> {
    match children {
        [] => sql.push_str(op.neutral_sql()),
        [only] => only.compile(sql, binds, scope)?,
        _ => {
            sql.push('(');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    sql.push_str(op.separator());
                }
                child.compile(sql, binds, scope)?;
            }
            sql.push(')');
        }
    }
    Ok(())
}

//! Query compilation.
//!
//! Clauses are emitted in a fixed order: SELECT list, FROM (primary source
//! and implicit-join tables), explicit JOINs, WHERE, GROUP BY, HAVING,
//! ORDER BY, LIMIT/OFFSET. Bind values follow the same order, so the Nth
//! `?` of the text always matches the Nth value.

use tracing::debug;

use super::{Assignments, Direction, OrderTarget, Query, Source};
use crate::column::{ColumnRef, SelectColumn, TableContext};
use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::expr::Scope;
use crate::join::{validate_chain, JoinKind, QueryJoin};
use crate::plan::{
    ColumnSlot, CountPlan, DeletePlan, InsertPlan, SelectPlan, Statement, StatementKind,
    UpdatePlan,
};
use crate::value::BindValue;

type TableKey = (String, Option<String>);

fn table_key(table: &TableContext) -> TableKey {
    (
        String::from(table.name()),
        table.alias().map(String::from),
    )
}

/// Output of one SELECT compilation.
struct Compiled {
    sql: String,
    binds: Vec<BindValue>,
    has_where: bool,
    layout: Vec<ColumnSlot>,
}

fn slot_sql(slot: &ColumnSlot) -> String {
    match slot {
        ColumnSlot::Column(column) => column.qualified_sql(),
        ColumnSlot::Expression(sql) => sql.clone(),
    }
}

impl Query {
    /// Every table the query reads: the primary source, then join tables.
    fn sources(&self) -> Vec<TableContext> {
        let mut sources = vec![self.primary().clone()];
        for join in &self.joins {
            for table in [join.join().left_table(), join.join().right_table()] {
                if !sources.contains(table) {
                    sources.push(table.clone());
                }
            }
        }
        sources
    }

    fn layout(&self, sources: &[TableContext]) -> Result<Vec<ColumnSlot>> {
        if self.select.is_empty() {
            return Ok(self
                .primary()
                .all_columns()
                .into_iter()
                .map(ColumnSlot::Column)
                .collect());
        }
        let mut layout = Vec::new();
        for entry in &self.select {
            match entry {
                SelectColumn::All(table) => {
                    layout.extend(table.all_columns().into_iter().map(ColumnSlot::Column));
                }
                SelectColumn::Column(target) => {
                    let column = target.resolve(Some(self.primary()), sources)?;
                    layout.push(ColumnSlot::Column(column));
                }
                SelectColumn::Raw(sql) => layout.push(ColumnSlot::Expression(sql.clone())),
            }
        }
        Ok(layout)
    }

    /// Resolved columns of the SELECT list, skipping verbatim entries.
    pub(crate) fn selected_columns(&self) -> Result<Vec<ColumnRef>> {
        Ok(self
            .layout(&self.sources())?
            .into_iter()
            .filter_map(|slot| match slot {
                ColumnSlot::Column(column) => Some(column),
                ColumnSlot::Expression(_) => None,
            })
            .collect())
    }

    /// Renders FROM and JOIN. Returns the clause text and the implicit-join
    /// conditions destined for WHERE.
    fn from_clause(
        &self,
        dialect: &dyn Dialect,
        binds: &mut Vec<BindValue>,
    ) -> Result<(String, Vec<String>)> {
        let mut from: Vec<(TableKey, String)> = Vec::new();
        match &self.source {
            Source::Table(table) => from.push((table_key(table), table.from_clause_sql())),
            Source::SubQuery { query, context } => {
                if !dialect.supports_derived_tables() {
                    return Err(CompileError::DialectCapabilityMissing {
                        dialect: dialect.name(),
                        feature: "sub-queries in FROM",
                    });
                }
                let (sub_sql, sub_binds) = query.compile_nested(dialect)?;
                binds.extend(sub_binds);
                from.push((
                    table_key(context),
                    format!("({sub_sql}) AS {}", context.name()),
                ));
            }
        }

        let mut conditions = Vec::new();
        for join in self.joins.iter().map(QueryJoin::join) {
            if join.kind() != JoinKind::Implicit {
                continue;
            }
            for table in [join.left_table(), join.right_table()] {
                let key = table_key(table);
                if !from.iter().any(|(k, _)| *k == key) {
                    from.push((key, table.from_clause_sql()));
                }
            }
            conditions.push(join.condition_sql(dialect, self.ignore_case));
        }

        let mut clauses = Vec::new();
        let mut joined = Vec::new();
        for join in self.joins.iter().map(QueryJoin::join) {
            if let Some(clause) = join.clause_sql(dialect) {
                let key = table_key(join.right_table());
                if from.first().is_some_and(|(primary, _)| *primary == key) {
                    return Err(CompileError::UnaliasedSelfJoin(String::from(
                        join.right_table().alias_or_name(),
                    )));
                }
                clauses.push(clause);
                joined.push(key);
            }
        }
        // The primary source is never in `joined`, so it stays first.
        from.retain(|(key, _)| !joined.contains(key));

        let mut sql = from
            .into_iter()
            .map(|(_, sql)| sql)
            .collect::<Vec<_>>()
            .join(", ");
        for clause in clauses {
            sql.push(' ');
            sql.push_str(&clause);
        }
        Ok((sql, conditions))
    }

    fn scope<'a>(&'a self, dialect: &'a dyn Dialect, sources: &'a [TableContext]) -> Scope<'a> {
        Scope {
            dialect,
            ignore_case: self.ignore_case,
            table: Some(self.primary()),
            sources,
        }
    }

    /// WHERE condition: implicit-join conditions AND the filter tree.
    fn where_condition(
        &self,
        mut fragments: Vec<String>,
        binds: &mut Vec<BindValue>,
        scope: &Scope<'_>,
    ) -> Result<Option<String>> {
        if !self.filter.is_empty() {
            let mut sql = String::new();
            self.filter.compile(&mut sql, binds, scope)?;
            fragments.push(sql);
        }
        if fragments.is_empty() {
            Ok(None)
        } else {
            Ok(Some(fragments.join(" AND ")))
        }
    }

    fn order_entry(
        &self,
        target: &OrderTarget,
        direction: Direction,
        dialect: &dyn Dialect,
        sources: &[TableContext],
    ) -> Result<String> {
        let sql = match target {
            OrderTarget::Column(target) => {
                let column = target.resolve(Some(self.primary()), sources)?;
                if self.ignore_case && column.is_text() {
                    dialect.ignore_case_in_order_by(&column.qualified_sql())
                } else {
                    column.qualified_sql()
                }
            }
            OrderTarget::Raw(raw) => raw.clone(),
        };
        Ok(format!("{sql} {}", direction.as_str()))
    }

    /// Compiles the SELECT. With `count_only`, the SELECT list is
    /// `COUNT(*)` and ORDER BY, LIMIT and OFFSET are left out.
    fn compile_select(&self, dialect: &dyn Dialect, count_only: bool) -> Result<Compiled> {
        validate_chain(&self.joins)?;
        let sources = self.sources();
        let scope = self.scope(dialect, &sources);
        let layout = self.layout(&sources)?;
        let mut binds = Vec::new();

        let mut sql = String::from("SELECT ");
        if count_only {
            sql.push_str("COUNT(*)");
        } else {
            if self.distinct {
                sql.push_str("DISTINCT ");
            }
            sql.push_str(&layout.iter().map(slot_sql).collect::<Vec<_>>().join(", "));
        }

        let (from, fragments) = self.from_clause(dialect, &mut binds)?;
        sql.push_str(" FROM ");
        sql.push_str(&from);

        let condition = self.where_condition(fragments, &mut binds, &scope)?;
        if let Some(condition) = &condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }

        if !self.group_by.is_empty() {
            let columns = self
                .group_by
                .iter()
                .map(|target| {
                    target
                        .resolve(Some(self.primary()), &sources)
                        .map(|column| column.qualified_sql())
                })
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" GROUP BY ");
            sql.push_str(&columns.join(", "));
        }

        if let Some(having) = self.having.as_ref().filter(|h| !h.is_empty()) {
            sql.push_str(" HAVING ");
            having.compile(&mut sql, &mut binds, &scope)?;
        }

        if !count_only {
            if !self.order_by.is_empty() {
                let entries = self
                    .order_by
                    .iter()
                    .map(|(target, direction)| {
                        self.order_entry(target, *direction, dialect, &sources)
                    })
                    .collect::<Result<Vec<_>>>()?;
                sql.push_str(" ORDER BY ");
                sql.push_str(&entries.join(", "));
            }
            sql = dialect.apply_limit_offset(&sql, self.limit, self.offset)?;
        }

        Ok(Compiled {
            sql,
            binds,
            has_where: condition.is_some(),
            layout,
        })
    }

    /// Compiles the query for use inside another statement.
    pub(crate) fn compile_nested(&self, dialect: &dyn Dialect) -> Result<(String, Vec<BindValue>)> {
        let compiled = self.compile_select(dialect, false)?;
        Ok((compiled.sql, compiled.binds))
    }

    /// Compiles a SELECT returning the query's rows.
    ///
    /// # Errors
    ///
    /// Returns the first resolution, contract or dialect error found.
    pub fn select_plan(&self, dialect: &dyn Dialect) -> Result<SelectPlan> {
        let compiled = self.compile_select(dialect, false)?;
        debug!(sql = %compiled.sql, binds = compiled.binds.len(), "compiled select");
        let statement = Statement::new(
            compiled.sql,
            compiled.binds,
            StatementKind::Select,
            String::from(self.primary().alias_or_name()),
            compiled.has_where,
        );
        Ok(SelectPlan::new(
            statement,
            compiled.layout,
            self.primary().clone(),
            self.joins.clone(),
        ))
    }

    /// Compiles a `SELECT COUNT(*)` over the query's rows.
    ///
    /// DISTINCT, GROUP BY, HAVING, LIMIT and OFFSET change what is counted,
    /// so such queries are wrapped as a derived table.
    ///
    /// # Errors
    ///
    /// Same as [`Self::select_plan`].
    pub fn count_plan(&self, dialect: &dyn Dialect) -> Result<CountPlan> {
        let wrap = self.distinct
            || !self.group_by.is_empty()
            || self.having.is_some()
            || self.has_limit_or_offset();
        let (sql, binds, has_where) = if wrap {
            let inner = self.compile_select(dialect, false)?;
            (
                format!("SELECT COUNT(*) FROM ({}) AS count_subquery", inner.sql),
                inner.binds,
                inner.has_where,
            )
        } else {
            let compiled = self.compile_select(dialect, true)?;
            (compiled.sql, compiled.binds, compiled.has_where)
        };
        debug!(sql = %sql, binds = binds.len(), "compiled count");
        Ok(CountPlan::new(Statement::new(
            sql,
            binds,
            StatementKind::Count,
            String::from(self.primary().alias_or_name()),
            has_where,
        )))
    }

    fn mutation_target(&self, statement: &'static str) -> Result<&TableContext> {
        match &self.source {
            Source::Table(table) if table.alias().is_none() && self.joins.is_empty() => Ok(table),
            _ => Err(CompileError::UnsupportedMutationSource { statement }),
        }
    }

    fn mutation_where(
        &self,
        table: &TableContext,
        dialect: &dyn Dialect,
        binds: &mut Vec<BindValue>,
    ) -> Result<Option<String>> {
        let sources = [table.clone()];
        self.where_condition(Vec::new(), binds, &self.scope(dialect, &sources))
    }

    fn bounded(statement: Statement) -> Result<Statement> {
        statement.ensure_bounded()?;
        debug!(
            sql = %statement.sql(),
            binds = statement.binds().len(),
            "compiled {}",
            statement.kind().as_str()
        );
        Ok(statement)
    }

    /// Compiles an UPDATE of the rows matching the WHERE tree.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnsupportedMutationSource`] unless the query reads a
    /// single unaliased table without joins,
    /// [`CompileError::EmptyAssignments`] for an empty SET list,
    /// [`CompileError::RefusedUnboundedMutation`] without WHERE condition,
    /// plus any resolution error.
    pub fn update_plan(
        &self,
        assignments: &Assignments,
        dialect: &dyn Dialect,
    ) -> Result<UpdatePlan> {
        let table = self.mutation_target("UPDATE")?;
        if assignments.is_empty() {
            return Err(CompileError::EmptyAssignments {
                statement: "UPDATE",
                table: String::from(table.name()),
            });
        }

        let mut binds = Vec::new();
        let mut sets = Vec::new();
        for (target, value) in assignments.entries() {
            let column = target.resolve(Some(table), &[])?;
            match BindValue::new(column.column_type(), value.clone()) {
                Some(bind) => {
                    sets.push(format!("{} = ?", column.name()));
                    binds.push(bind);
                }
                None => sets.push(format!("{} = NULL", column.name())),
            }
        }
        let mut sql = format!("UPDATE {} SET {}", table.name(), sets.join(", "));

        let condition = self.mutation_where(table, dialect, &mut binds)?;
        if let Some(condition) = &condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        let statement = Statement::new(
            sql,
            binds,
            StatementKind::Update,
            String::from(table.name()),
            condition.is_some(),
        );
        Ok(UpdatePlan::new(Self::bounded(statement)?))
    }

    /// Compiles a DELETE of the rows matching the WHERE tree.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnsupportedMutationSource`] unless the query reads a
    /// single unaliased table without joins,
    /// [`CompileError::RefusedUnboundedMutation`] without WHERE condition,
    /// plus any resolution error.
    pub fn delete_plan(&self, dialect: &dyn Dialect) -> Result<DeletePlan> {
        let table = self.mutation_target("DELETE")?;
        let mut binds = Vec::new();
        let mut sql = format!("DELETE FROM {}", table.name());
        let condition = self.mutation_where(table, dialect, &mut binds)?;
        if let Some(condition) = &condition {
            sql.push_str(" WHERE ");
            sql.push_str(condition);
        }
        let statement = Statement::new(
            sql,
            binds,
            StatementKind::Delete,
            String::from(table.name()),
            condition.is_some(),
        );
        Ok(DeletePlan::new(Self::bounded(statement)?))
    }

    /// Compiles a DELETE of every row of the table. Filters on the query
    /// are not consulted.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnsupportedMutationSource`] unless the query reads a
    /// single unaliased table without joins.
    pub fn delete_all_plan(&self) -> Result<DeletePlan> {
        let table = self.mutation_target("DELETE")?;
        let statement = Statement::new(
            format!("DELETE FROM {}", table.name()),
            Vec::new(),
            StatementKind::DeleteAll,
            String::from(table.name()),
            false,
        );
        Ok(DeletePlan::new(Self::bounded(statement)?))
    }

    /// Compiles a single-row INSERT of `assignments` into the query's table.
    /// NULL values are written inline.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnsupportedMutationSource`] unless the query reads a
    /// single unaliased table without joins,
    /// [`CompileError::EmptyAssignments`] for an empty column list,
    /// plus any resolution error.
    pub fn insert_plan(&self, assignments: &Assignments) -> Result<InsertPlan> {
        let table = self.mutation_target("INSERT")?;
        if assignments.is_empty() {
            return Err(CompileError::EmptyAssignments {
                statement: "INSERT",
                table: String::from(table.name()),
            });
        }

        let mut binds = Vec::new();
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (target, value) in assignments.entries() {
            let column = target.resolve(Some(table), &[])?;
            columns.push(String::from(column.name()));
            match BindValue::new(column.column_type(), value.clone()) {
                Some(bind) => {
                    values.push("?");
                    binds.push(bind);
                }
                None => values.push("NULL"),
            }
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            values.join(", ")
        );
        let statement = Statement::new(
            sql,
            binds,
            StatementKind::Insert,
            String::from(table.name()),
            false,
        );
        Ok(InsertPlan::new(Self::bounded(statement)?))
    }
}

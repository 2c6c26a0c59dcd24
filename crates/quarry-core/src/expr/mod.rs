//! Predicate trees.
//!
//! An [`Expr`] is a tree of column comparisons combined with AND/OR. It is
//! compiled into SQL with `?` placeholders and a matching list of
//! [`BindValue`]s.
//!
//! ```
//! use quarry_core::{col, Expr};
//!
//! let expr = Expr::any([col("Title").like("%Rust%"), col("Price").lt(20)]);
//! assert!(!expr.is_empty());
//! ```

mod compile;

use std::fmt;

use crate::column::{ColumnTarget, TableContext};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::query::Query;
use crate::value::{BindValue, SqlValue, ToSqlValue};

pub(crate) use compile::Scope;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
}

impl CompareOp {
    /// The SQL operator text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set membership operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiOp {
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
}

impl MultiOp {
    /// The SQL operator text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::In => "IN",
            Self::NotIn => "NOT IN",
        }
    }

    /// Clause emitted for an empty list: always false for IN, always true
    /// for NOT IN.
    #[must_use]
    pub const fn empty_set_sql(self) -> &'static str {
        match self {
            Self::In => "1<>1",
            Self::NotIn => "1=1",
        }
    }
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    And,
    Or,
}

impl LogicOp {
    /// Separator placed between children.
    #[must_use]
    pub const fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }

    /// Clause equivalent to a node of this operator without children.
    #[must_use]
    pub const fn neutral_sql(self) -> &'static str {
        match self {
            Self::And => "1=1",
            Self::Or => "1<>1",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A runtime value, bound as a parameter unless it is NULL.
    Value(SqlValue),
    /// A nested query, spliced in parentheses.
    SubQuery(Box<Query>),
    /// Verbatim SQL. Not escaped and never case folded.
    Raw(String),
}

/// Right-hand side of IN / NOT IN.
#[derive(Debug, Clone)]
pub enum MultiValues {
    List(Vec<SqlValue>),
    SubQuery(Box<Query>),
}

/// The shape of an expression node.
#[derive(Debug, Clone)]
pub enum ExprKind {
    Compare(ColumnTarget, CompareOp, Operand),
    MultiValue(ColumnTarget, MultiOp, MultiValues),
    Logic(LogicOp, Vec<Expr>),
    Raw(String),
}

/// A node of a predicate tree.
#[derive(Debug, Clone)]
pub struct Expr {
    kind: ExprKind,
    ignore_case: Option<bool>,
    table: Option<TableContext>,
}

impl Expr {
    const fn from_kind(kind: ExprKind) -> Self {
        Self {
            kind,
            ignore_case: None,
            table: None,
        }
    }

    /// AND of `children`.
    #[must_use]
    pub fn all<I: IntoIterator<Item = Self>>(children: I) -> Self {
        Self::logic(LogicOp::And, children)
    }

    /// OR of `children`.
    #[must_use]
    pub fn any<I: IntoIterator<Item = Self>>(children: I) -> Self {
        Self::logic(LogicOp::Or, children)
    }

    fn logic<I: IntoIterator<Item = Self>>(op: LogicOp, children: I) -> Self {
        children
            .into_iter()
            .fold(Self::from_kind(ExprKind::Logic(op, Vec::new())), Self::push)
    }

    /// Verbatim SQL.
    ///
    /// **Warning**: never pass user input here.
    #[must_use]
    pub fn raw(sql: &str) -> Self {
        Self::from_kind(ExprKind::Raw(String::from(sql)))
    }

    /// A comparison with an explicit operand.
    #[must_use]
    pub fn compare(column: impl Into<ColumnTarget>, op: CompareOp, operand: Operand) -> Self {
        Self::from_kind(ExprKind::Compare(column.into(), op, operand))
    }

    /// A set membership test.
    #[must_use]
    pub fn multi(column: impl Into<ColumnTarget>, op: MultiOp, values: MultiValues) -> Self {
        Self::from_kind(ExprKind::MultiValue(column.into(), op, values))
    }

    /// The node's shape.
    #[must_use]
    pub const fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// True for an AND/OR node whose subtree holds no predicate. At the root
    /// such a tree compiles to nothing, so it never bounds a WHERE clause.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.kind {
            ExprKind::Logic(_, children) => children.iter().all(Self::is_empty),
            _ => false,
        }
    }

    /// Adds `child` to this AND/OR node. The child takes this node's
    /// ignore-case setting unless it has one of its own.
    ///
    /// On any other node, returns the AND of `self` and `child`.
    #[must_use]
    pub fn push(mut self, mut child: Self) -> Self {
        if let ExprKind::Logic(_, children) = &mut self.kind {
            if let Some(flag) = self.ignore_case {
                child.inherit_ignore_case(flag);
            }
            children.push(child);
            return self;
        }
        Self::all([self, child])
    }

    /// `self AND other`, extending `self` when it already is an AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        if matches!(self.kind, ExprKind::Logic(LogicOp::And, _)) {
            self.push(other)
        } else {
            Self::all([self, other])
        }
    }

    /// `self OR other`, extending `self` when it already is an OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        if matches!(self.kind, ExprKind::Logic(LogicOp::Or, _)) {
            self.push(other)
        } else {
            Self::any([self, other])
        }
    }

    /// Sets whether textual comparisons in this subtree ignore case.
    /// Descendants that set their own value keep it.
    #[must_use]
    pub fn ignore_case(mut self, flag: bool) -> Self {
        self.ignore_case = Some(flag);
        if let ExprKind::Logic(_, children) = &mut self.kind {
            for child in children {
                child.inherit_ignore_case(flag);
            }
        }
        self
    }

    fn inherit_ignore_case(&mut self, flag: bool) {
        if self.ignore_case.is_none() {
            self.ignore_case = Some(flag);
            if let ExprKind::Logic(_, children) = &mut self.kind {
                for child in children {
                    child.inherit_ignore_case(flag);
                }
            }
        }
    }

    /// Sets the table that bare column names in this subtree resolve to.
    #[must_use]
    pub fn in_table(mut self, table: &TableContext) -> Self {
        self.table = Some(table.clone());
        self
    }

    /// Compiles the expression on its own.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or contract error found in the tree.
    pub fn build(&self, dialect: &dyn Dialect) -> Result<(String, Vec<BindValue>)> {
        let mut sql = String::new();
        let mut binds = Vec::new();
        if !self.is_empty() {
            self.compile(&mut sql, &mut binds, &Scope::new(dialect))?;
        }
        Ok((sql, binds))
    }
}

/// Starts a comparison on a column.
#[must_use]
pub fn col(column: impl Into<ColumnTarget>) -> Column {
    Column {
        target: column.into(),
    }
}

/// A column waiting for an operator.
#[derive(Debug, Clone)]
pub struct Column {
    target: ColumnTarget,
}

impl Column {
    fn value<T: ToSqlValue>(self, op: CompareOp, value: T) -> Expr {
        Expr::compare(self.target, op, Operand::Value(value.to_sql_value()))
    }

    /// Creates an equality expression. A NULL value compiles to `IS NULL`.
    #[must_use]
    pub fn eq<T: ToSqlValue>(self, value: T) -> Expr {
        self.value(CompareOp::Eq, value)
    }

    /// Creates an inequality expression. A NULL value compiles to
    /// `IS NOT NULL`.
    #[must_use]
    pub fn not_eq<T: ToSqlValue>(self, value: T) -> Expr {
        self.value(CompareOp::NotEq, value)
    }

    /// Creates a less-than expression.
    #[must_use]
    pub fn lt<T: ToSqlValue>(self, value: T) -> Expr {
        self.value(CompareOp::Lt, value)
    }

    /// Creates a less-than-or-equal expression.
    #[must_use]
    pub fn lt_eq<T: ToSqlValue>(self, value: T) -> Expr {
        self.value(CompareOp::LtEq, value)
    }

    /// Creates a greater-than expression.
    #[must_use]
    pub fn gt<T: ToSqlValue>(self, value: T) -> Expr {
        self.value(CompareOp::Gt, value)
    }

    /// Creates a greater-than-or-equal expression.
    #[must_use]
    pub fn gt_eq<T: ToSqlValue>(self, value: T) -> Expr {
        self.value(CompareOp::GtEq, value)
    }

    /// Creates a LIKE expression.
    #[must_use]
    pub fn like<T: ToSqlValue>(self, pattern: T) -> Expr {
        self.value(CompareOp::Like, pattern)
    }

    /// Creates a NOT LIKE expression.
    #[must_use]
    pub fn not_like<T: ToSqlValue>(self, pattern: T) -> Expr {
        self.value(CompareOp::NotLike, pattern)
    }

    /// Creates an IS NULL expression.
    #[must_use]
    pub fn is_null(self) -> Expr {
        self.value(CompareOp::Eq, SqlValue::Null)
    }

    /// Creates an IS NOT NULL expression.
    #[must_use]
    pub fn is_not_null(self) -> Expr {
        self.value(CompareOp::NotEq, SqlValue::Null)
    }

    /// Compares against verbatim SQL, e.g. another column or a function
    /// call. No value is bound.
    #[must_use]
    pub fn compare_raw(self, op: CompareOp, sql: &str) -> Expr {
        Expr::compare(self.target, op, Operand::Raw(String::from(sql)))
    }

    /// Compares against the single value produced by a sub-query.
    #[must_use]
    pub fn compare_query(self, op: CompareOp, query: Query) -> Expr {
        Expr::compare(self.target, op, Operand::SubQuery(Box::new(query)))
    }

    /// Creates an IN expression. An empty list is always false.
    #[must_use]
    pub fn in_list<T: ToSqlValue>(self, values: Vec<T>) -> Expr {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        Expr::multi(self.target, MultiOp::In, MultiValues::List(values))
    }

    /// Creates a NOT IN expression. An empty list is always true.
    #[must_use]
    pub fn not_in_list<T: ToSqlValue>(self, values: Vec<T>) -> Expr {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        Expr::multi(self.target, MultiOp::NotIn, MultiValues::List(values))
    }

    /// Creates an IN (sub-query) expression.
    #[must_use]
    pub fn in_query(self, query: Query) -> Expr {
        Expr::multi(self.target, MultiOp::In, MultiValues::SubQuery(Box::new(query)))
    }

    /// Creates a NOT IN (sub-query) expression.
    #[must_use]
    pub fn not_in_query(self, query: Query) -> Expr {
        Expr::multi(
            self.target,
            MultiOp::NotIn,
            MultiValues::SubQuery(Box::new(query)),
        )
    }
}

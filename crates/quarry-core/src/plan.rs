//! Compiled statements.
//!
//! Each plan owns its SQL text and bind values. Plans are produced by
//! [`Query`](crate::Query) and never share state with it.

use tracing::warn;

use crate::column::{ColumnRef, TableContext};
use crate::error::{CompileError, Result};
use crate::join::QueryJoin;
use crate::value::{interpolate, BindValue};

/// What a statement does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Count,
    Insert,
    Update,
    Delete,
    /// A DELETE of every row, requested explicitly.
    DeleteAll,
}

impl StatementKind {
    /// Leading SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select | Self::Count => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete | Self::DeleteAll => "DELETE",
        }
    }

    /// Whether the statement changes rows.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::Select | Self::Count)
    }

    /// Whether the statement must carry a WHERE clause to run.
    #[must_use]
    pub const fn requires_where(self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }
}

/// SQL text with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    binds: Vec<BindValue>,
    kind: StatementKind,
    table: String,
    has_where: bool,
}

impl Statement {
    pub(crate) const fn new(
        sql: String,
        binds: Vec<BindValue>,
        kind: StatementKind,
        table: String,
        has_where: bool,
    ) -> Self {
        Self {
            sql,
            binds,
            kind,
            table,
            has_where,
        }
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Values for the placeholders, in placeholder order.
    #[must_use]
    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    /// The statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The primary table (or derived-table alias).
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Whether the statement has a WHERE clause.
    #[must_use]
    pub const fn has_where(&self) -> bool {
        self.has_where
    }

    /// Consumes the statement, returning the SQL and the binds.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<BindValue>) {
        (self.sql, self.binds)
    }

    /// The SQL with values inlined. For logs only.
    #[must_use]
    pub fn interpolated(&self) -> String {
        interpolate(&self.sql, &self.binds)
    }

    /// Rejects an UPDATE or DELETE without WHERE clause. INSERT and an
    /// explicit delete-all pass.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::RefusedUnboundedMutation`].
    pub fn ensure_bounded(&self) -> Result<()> {
        if self.kind.requires_where() && !self.has_where {
            warn!(
                statement = self.kind.as_str(),
                table = %self.table,
                "refusing mutation without WHERE clause"
            );
            return Err(CompileError::RefusedUnboundedMutation {
                statement: self.kind.as_str(),
                table: self.table.clone(),
            });
        }
        Ok(())
    }
}

/// One entry of a SELECT list, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSlot {
    Column(ColumnRef),
    /// Verbatim SQL; not hydrated.
    Expression(String),
}

impl ColumnSlot {
    /// The table a column slot belongs to.
    #[must_use]
    pub const fn table(&self) -> Option<&TableContext> {
        match self {
            Self::Column(column) => Some(column.table()),
            Self::Expression(_) => None,
        }
    }
}

/// A compiled SELECT plus what hydration needs to read its rows.
#[derive(Debug, Clone)]
pub struct SelectPlan {
    statement: Statement,
    layout: Vec<ColumnSlot>,
    primary: TableContext,
    joins: Vec<QueryJoin>,
}

impl SelectPlan {
    pub(crate) const fn new(
        statement: Statement,
        layout: Vec<ColumnSlot>,
        primary: TableContext,
        joins: Vec<QueryJoin>,
    ) -> Self {
        Self {
            statement,
            layout,
            primary,
            joins,
        }
    }

    /// The compiled statement.
    #[must_use]
    pub const fn statement(&self) -> &Statement {
        &self.statement
    }

    /// SELECT list entries, in output order.
    #[must_use]
    pub fn layout(&self) -> &[ColumnSlot] {
        &self.layout
    }

    /// The query's primary table.
    #[must_use]
    pub const fn primary(&self) -> &TableContext {
        &self.primary
    }

    /// The query's joins, in insertion order.
    #[must_use]
    pub fn joins(&self) -> &[QueryJoin] {
        &self.joins
    }
}

macro_rules! statement_plan {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, PartialEq)]
            pub struct $name {
                statement: Statement,
            }

            impl $name {
                pub(crate) const fn new(statement: Statement) -> Self {
                    Self { statement }
                }

                /// The compiled statement.
                #[must_use]
                pub const fn statement(&self) -> &Statement {
                    &self.statement
                }
            }
        )+
    };
}

statement_plan!(
    /// A compiled `SELECT COUNT(*)`.
    CountPlan,
    /// A compiled single-row INSERT.
    InsertPlan,
    /// A compiled UPDATE.
    UpdatePlan,
    /// A compiled DELETE, bounded by a WHERE clause or explicitly
    /// covering the whole table.
    DeletePlan,
);

//! Error types for query compilation.

use thiserror::Error;

/// Errors raised while building or compiling a query.
///
/// Every variant is reported synchronously to the caller of the compile
/// operation; no SQL is produced when one of them occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The column name could not be resolved against the table metadata.
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn {
        /// Table (SQL name) that was searched.
        table: String,
        /// Column name as given by the caller.
        column: String,
    },

    /// The table name could not be resolved against the metadata.
    #[error("unknown table '{0}'")]
    UnknownTable(String),

    /// A named column was used in an expression with no table context.
    #[error("column '{0}' has no table context to resolve against")]
    UnboundColumn(String),

    /// A relation name could not be resolved on a table.
    #[error("unknown relation '{relation}' on table '{table}'")]
    UnknownRelation {
        /// Table (SQL name) the relation was looked up on.
        table: String,
        /// Relation name as given by the caller.
        relation: String,
    },

    /// A NULL operand was used with an operator other than `=` / `!=`,
    /// or inside an IN / NOT IN list.
    #[error("cannot compare {column} {op} NULL")]
    UnsupportedNullComparison {
        /// Qualified column.
        column: String,
        /// Operator used.
        op: String,
    },

    /// A join chain has a cycle or a link outside the query's joins.
    #[error("invalid join chain: {0}")]
    InvalidJoinChain(String),

    /// A DELETE or UPDATE was compiled without any WHERE condition.
    #[error("refusing to perform {statement} on table '{table}' with empty WHERE clause")]
    RefusedUnboundedMutation {
        /// `DELETE` or `UPDATE`.
        statement: &'static str,
        /// Target table.
        table: String,
    },

    /// The target dialect cannot express the requested construct.
    #[error("dialect '{dialect}' does not support {feature}")]
    DialectCapabilityMissing {
        /// Dialect name.
        dialect: &'static str,
        /// Human-readable description of the construct.
        feature: &'static str,
    },

    /// A sub-query was used as a table without an alias.
    #[error("a sub-query used as a table requires a non-empty alias")]
    MissingSubQueryAlias,

    /// A mutation was requested on a source other than a plain table.
    #[error("{statement} requires a single unaliased table without joins")]
    UnsupportedMutationSource {
        /// `DELETE`, `UPDATE` or `INSERT`.
        statement: &'static str,
    },

    /// An UPDATE or INSERT was compiled without any column assignment.
    #[error("{statement} on table '{table}' has no assignments")]
    EmptyAssignments {
        /// `UPDATE` or `INSERT`.
        statement: &'static str,
        /// Target table.
        table: String,
    },

    /// An explicit join targets the query's primary source under the same
    /// name and alias.
    #[error("explicit join to '{0}' collides with the primary source; alias one side")]
    UnaliasedSelfJoin(String),

    /// The schema description could not be loaded.
    #[error("invalid schema: {0}")]
    Schema(String),
}

/// Result type alias for compile operations.
pub type Result<T> = std::result::Result<T, CompileError>;

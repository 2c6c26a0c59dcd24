//! SQL Dialect support.
//!
//! The compiler emits one SQL shape for every database. The few places where
//! databases disagree (case folding, LIMIT/OFFSET, operators with a
//! case-insensitive twin, temporal text formats) go through [`Dialect`].

mod generic;
mod mysql;
mod postgres;
mod sqlite;

use std::fmt;
use std::sync::Arc;

pub use generic::GenericDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use crate::error::Result;
use crate::expr::CompareOp;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Wraps an expression so that comparisons ignore case.
    fn ignore_case(&self, sql: &str) -> String {
        format!("UPPER({sql})")
    }

    /// Case fold used for ORDER BY entries.
    fn ignore_case_in_order_by(&self, sql: &str) -> String {
        self.ignore_case(sql)
    }

    /// An operator that compares case-insensitively on its own, used instead
    /// of folding both sides (e.g. `ILIKE` for `LIKE`).
    fn ignore_case_operator(&self, op: CompareOp) -> Option<&'static str> {
        let _ = op;
        None
    }

    /// Appends LIMIT/OFFSET to a statement.
    ///
    /// # Errors
    ///
    /// Dialects that cannot express the combination return
    /// [`crate::CompileError::DialectCapabilityMissing`].
    fn apply_limit_offset(
        &self,
        sql: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        let mut out = String::from(sql);
        if let Some(limit) = limit {
            out.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = offset {
            out.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(out)
    }

    /// Whether a sub-query may be used as a table in FROM.
    fn supports_derived_tables(&self) -> bool {
        true
    }

    /// Whether a sub-query used as an IN operand may carry LIMIT.
    fn supports_limit_in_in_subquery(&self) -> bool {
        true
    }

    /// `chrono` format for DATE values bound as text.
    fn date_format(&self) -> &'static str {
        "%Y-%m-%d"
    }

    /// `chrono` format for TIME values bound as text.
    fn time_format(&self) -> &'static str {
        "%H:%M:%S"
    }

    /// `chrono` format for TIMESTAMP values bound as text.
    fn timestamp_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }
}

/// Looks a dialect up by name (`generic`, `sqlite`, `postgres`/`pgsql`,
/// `mysql`), ignoring case.
#[must_use]
pub fn dialect_for_name(name: &str) -> Option<Arc<dyn Dialect>> {
    match name.to_ascii_lowercase().as_str() {
        "generic" => Some(Arc::new(GenericDialect::new())),
        "sqlite" => Some(Arc::new(SqliteDialect::new())),
        "postgres" | "postgresql" | "pgsql" => Some(Arc::new(PostgresDialect::new())),
        "mysql" => Some(Arc::new(MySqlDialect::new())),
        _ => None,
    }
}

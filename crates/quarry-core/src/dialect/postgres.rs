//! PostgreSQL dialect.

use super::Dialect;
use crate::expr::CompareOp;

/// PostgreSQL dialect. Case-insensitive pattern matching uses `ILIKE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn ignore_case_operator(&self, op: CompareOp) -> Option<&'static str> {
        match op {
            CompareOp::Like => Some("ILIKE"),
            CompareOp::NotLike => Some("NOT ILIKE"),
            _ => None,
        }
    }
}

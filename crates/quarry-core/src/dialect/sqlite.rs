//! SQLite dialect implementation.

use super::Dialect;
use crate::error::Result;

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn apply_limit_offset(
        &self,
        sql: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        // SQLite only accepts OFFSET after LIMIT; -1 means no limit.
        Ok(match (limit, offset) {
            (Some(limit), Some(offset)) => format!("{sql} LIMIT {limit} OFFSET {offset}"),
            (Some(limit), None) => format!("{sql} LIMIT {limit}"),
            (None, Some(offset)) => format!("{sql} LIMIT -1 OFFSET {offset}"),
            (None, None) => String::from(sql),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_dialect() {
        let dialect = SqliteDialect::new();
        assert_eq!(dialect.name(), "sqlite");
        assert_eq!(
            dialect.apply_limit_offset("SELECT 1", None, Some(3)).unwrap(),
            "SELECT 1 LIMIT -1 OFFSET 3"
        );
        assert_eq!(
            dialect.apply_limit_offset("SELECT 1", Some(2), None).unwrap(),
            "SELECT 1 LIMIT 2"
        );
    }
}

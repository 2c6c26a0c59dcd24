//! MySQL dialect.

use super::Dialect;
use crate::error::Result;

/// Largest row count MySQL accepts; used for "no limit" when only an
/// offset is given.
const MAX_ROWS: u64 = u64::MAX;

/// MySQL dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn apply_limit_offset(
        &self,
        sql: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<String> {
        Ok(match (limit, offset) {
            (Some(limit), Some(offset)) => format!("{sql} LIMIT {offset}, {limit}"),
            (Some(limit), None) => format!("{sql} LIMIT {limit}"),
            (None, Some(offset)) => format!("{sql} LIMIT {offset}, {MAX_ROWS}"),
            (None, None) => String::from(sql),
        })
    }

    fn supports_limit_in_in_subquery(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_limit_offset() {
        let dialect = MySqlDialect::new();
        assert_eq!(
            dialect.apply_limit_offset("SELECT 1", Some(10), Some(20)).unwrap(),
            "SELECT 1 LIMIT 20, 10"
        );
        assert_eq!(
            dialect.apply_limit_offset("SELECT 1", None, Some(20)).unwrap(),
            "SELECT 1 LIMIT 20, 18446744073709551615"
        );
        assert!(!dialect.supports_limit_in_in_subquery());
    }
}

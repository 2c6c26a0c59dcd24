//! Executor configuration.
//!
//! ```json
//! { "database_url": "sqlite://books.db", "max_connections": 4, "dialect": "sqlite" }
//! ```
//!
//! Every field is optional; missing fields take their default.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;

use crate::error::{ExecError, Result};
use crate::executor::SqliteExecutor;

/// Connection settings for a [`SqliteExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// sqlx connection URL.
    pub database_url: String,
    /// Upper bound of the pool size.
    pub max_connections: u32,
    /// Dialect name, see [`quarry_core::dialect_for_name`].
    pub dialect: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            database_url: String::from("sqlite::memory:"),
            max_connections: 1,
            dialect: String::from("sqlite"),
        }
    }
}

impl ExecutorConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Config`] for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Opens the pool and builds an executor.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::UnknownDialect`] or the driver's connection
    /// error.
    pub async fn connect(&self) -> Result<SqliteExecutor> {
        let dialect = quarry_core::dialect_for_name(&self.dialect)
            .ok_or_else(|| ExecError::UnknownDialect(self.dialect.clone()))?;
        info!(
            url = %self.database_url,
            max_connections = self.max_connections,
            dialect = dialect.name(),
            "Connecting"
        );
        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await?;
        Ok(SqliteExecutor::new(pool).with_dialect(dialect))
    }
}

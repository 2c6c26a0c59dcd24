//! Error types for statement execution.

use quarry_core::CompileError;

/// Errors raised while connecting, running a statement or decoding rows.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The driver failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The statement was rejected before reaching the driver.
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// A result column could not be turned into a value.
    #[error("Failed to decode column '{column}': {message}")]
    Decode {
        /// Column name as reported by the driver.
        column: String,
        /// Error message.
        message: String,
    },

    /// The configuration document is malformed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// No dialect is registered under the configured name.
    #[error("Unknown dialect '{0}'")]
    UnknownDialect(String),
}

/// Result type for execution operations.
pub type Result<T> = std::result::Result<T, ExecError>;

//! The boundary to a database driver.
//!
//! The compiler's only contract with an [`Executor`] is that the Nth `?` of
//! a [`Statement`] matches its Nth bind value.

use crate::error::CompileError;
use crate::plan::Statement;
use crate::value::SqlValue;

/// Rows returned by a query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    /// Creates a row set.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Column names as reported by the driver.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The rows, each in column order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Consumes the set, returning the rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<SqlValue>> {
        self.rows
    }
}

/// Result of running a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rows of a SELECT.
    Rows(RowSet),
    /// Rows changed by an INSERT, UPDATE or DELETE.
    Affected(u64),
}

/// Runs compiled statements.
///
/// Implementations must call [`Statement::ensure_bounded`] before running
/// an UPDATE or DELETE.
#[allow(async_fn_in_trait)]
pub trait Executor {
    /// Error type; compile errors raised at the boundary convert into it.
    type Error: From<CompileError>;

    /// Runs a SELECT and returns all rows.
    async fn fetch_all(&self, statement: &Statement) -> Result<RowSet, Self::Error>;

    /// Runs a mutation and returns the number of affected rows.
    async fn execute(&self, statement: &Statement) -> Result<u64, Self::Error>;

    /// Dispatches on the statement kind.
    async fn run(&self, statement: &Statement) -> Result<Outcome, Self::Error> {
        if statement.kind().is_mutation() {
            statement.ensure_bounded()?;
            Ok(Outcome::Affected(self.execute(statement).await?))
        } else {
            Ok(Outcome::Rows(self.fetch_all(statement).await?))
        }
    }
}

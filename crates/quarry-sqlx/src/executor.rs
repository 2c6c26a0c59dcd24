//! Running compiled statements against SQLite.

use std::sync::Arc;

use quarry_core::{
    hydrate, ColumnSlot, CountPlan, Dialect, Executor, Record, RowSet, SelectPlan, SqlValue,
    SqliteDialect, Statement,
};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::{debug, trace};

use crate::bind::{bind, coerce, restore};
use crate::error::{ExecError, Result};

/// Executes quarry statements on a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
    dialect: Arc<dyn Dialect>,
}

impl SqliteExecutor {
    /// Creates an executor using the SQLite dialect.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            dialect: Arc::new(SqliteDialect::new()),
        }
    }

    /// Replaces the dialect used for bind coercion and plan compilation.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Arc<dyn Dialect>) -> Self {
        self.dialect = dialect;
        self
    }

    /// Returns the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the dialect plans should be compiled with.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn prepare<'q>(&self, statement: &'q Statement) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        let mut query = sqlx::query(statement.sql());
        for (position, value) in statement.binds().iter().enumerate() {
            trace!(position, column_type = ?value.column_type(), "Binding parameter");
            query = bind(query, coerce(value, self.dialect.as_ref()));
        }
        query
    }

    /// Runs a SELECT plan and hydrates every row into a [`Record`] graph.
    ///
    /// Column values are reinterpreted by their declared type first, so
    /// boolean and temporal columns come back as such.
    pub async fn fetch_records(&self, plan: &SelectPlan) -> Result<Vec<Record>> {
        let rows = self.fetch_all(plan.statement()).await?;
        rows.into_rows()
            .into_iter()
            .map(|row| -> Result<Record> {
                let row: Vec<SqlValue> = plan
                    .layout()
                    .iter()
                    .zip(row)
                    .map(|(slot, value)| match slot {
                        ColumnSlot::Column(column) => {
                            restore(column.column_type(), value, self.dialect.as_ref())
                        }
                        ColumnSlot::Expression(_) => value,
                    })
                    .collect();
                hydrate(plan, &row).map_err(ExecError::from)
            })
            .collect()
    }

    /// Runs a COUNT plan.
    pub async fn count(&self, plan: &CountPlan) -> Result<u64> {
        let rows = self.fetch_all(plan.statement()).await?;
        match rows.rows().first().and_then(|row| row.first()) {
            Some(SqlValue::Int(n)) => u64::try_from(*n).map_err(|e| ExecError::Decode {
                column: String::from("COUNT(*)"),
                message: e.to_string(),
            }),
            other => Err(ExecError::Decode {
                column: String::from("COUNT(*)"),
                message: format!("expected an integer, got {other:?}"),
            }),
        }
    }
}

fn decode_column(row: &SqliteRow, index: usize) -> Result<SqlValue> {
    let decode_error = |e: sqlx::Error| ExecError::Decode {
        column: String::from(row.column(index).name()),
        message: e.to_string(),
    };
    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index).map_err(decode_error)?),
        "REAL" | "NUMERIC" => SqlValue::Float(row.try_get_unchecked(index).map_err(decode_error)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index).map_err(decode_error)?),
        _ => SqlValue::Text(row.try_get_unchecked(index).map_err(decode_error)?),
    };
    Ok(value)
}

fn decode_row(row: &SqliteRow) -> Result<Vec<SqlValue>> {
    (0..row.len()).map(|index| decode_column(row, index)).collect()
}

impl Executor for SqliteExecutor {
    type Error = ExecError;

    async fn fetch_all(&self, statement: &Statement) -> Result<RowSet> {
        debug!(
            sql = %statement.sql(),
            binds = statement.binds().len(),
            "Fetching rows"
        );
        let rows = self.prepare(statement).fetch_all(&self.pool).await?;
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|column| String::from(column.name()))
                    .collect()
            })
            .unwrap_or_default();
        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
        debug!(rows = rows.len(), "Fetched rows");
        Ok(RowSet::new(columns, rows))
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        statement.ensure_bounded()?;
        debug!(
            sql = %statement.sql(),
            binds = statement.binds().len(),
            "Executing statement"
        );
        let result = self.prepare(statement).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

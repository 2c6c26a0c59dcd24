//! # quarry-sqlx
//!
//! Runs [`quarry_core`] plans on SQLite through `sqlx`.
//!
//! [`SqliteExecutor`] implements [`quarry_core::Executor`]: it binds each
//! value of a [`quarry_core::Statement`] to its placeholder in order,
//! formatting dates and times with the dialect's formats, and decodes result
//! rows back into [`quarry_core::SqlValue`]s.
//!
//! ```rust,no_run
//! use quarry_core::Executor;
//! use quarry_sqlx::ExecutorConfig;
//!
//! # async fn demo(plan: quarry_core::SelectPlan) -> quarry_sqlx::Result<()> {
//! let executor = ExecutorConfig::default().connect().await?;
//! let rows = executor.fetch_all(plan.statement()).await?;
//! println!("{} rows", rows.len());
//! # Ok(())
//! # }
//! ```

pub mod bind;
pub mod config;
pub mod error;
pub mod executor;

pub use config::ExecutorConfig;
pub use error::{ExecError, Result};
pub use executor::SqliteExecutor;

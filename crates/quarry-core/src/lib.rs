//! # quarry-core
//!
//! A parameterized SQL query compiler.
//!
//! Callers describe a query with a builder: a primary table (or a nested
//! query used as a derived table), a tree of predicates, joins, and the
//! usual SELECT modifiers. Compiling it yields SQL text with `?`
//! placeholders and the values to bind, in placeholder order.
//!
//! This crate provides:
//! - Read-only table metadata, built in code or loaded from JSON
//! - Predicate trees with NULL-aware comparisons and exact parenthesization
//! - Implicit and explicit joins, and relation chains for hydration
//! - SELECT, COUNT, UPDATE and DELETE plans
//! - Per-database [`Dialect`]s and an async [`Executor`] boundary
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use quarry_core::schema::{ColumnMap, ColumnType, DatabaseMap, TableMap};
//! use quarry_core::{col, GenericDialect, Query};
//!
//! let db = DatabaseMap::new("bookstore").with_table(
//!     TableMap::new("book")
//!         .column(ColumnMap::new("id", ColumnType::Integer).field("Id"))
//!         .column(ColumnMap::new("title", ColumnType::Varchar).field("Title")),
//! );
//!
//! let plan = Query::from_table(Arc::new(db), "book")?
//!     .filter(col("Title").eq("'; DROP TABLE book; --"))
//!     .select_plan(&GenericDialect::new())?;
//!
//! assert_eq!(
//!     plan.statement().sql(),
//!     "SELECT book.id, book.title FROM book WHERE book.title = ?"
//! );
//! assert_eq!(plan.statement().binds().len(), 1);
//! # Ok::<(), quarry_core::CompileError>(())
//! ```

pub mod column;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod expr;
pub mod hydrate;
pub mod join;
pub mod plan;
pub mod query;
pub mod schema;
pub mod value;

pub use column::{ColumnRef, ColumnTarget, SelectColumn, TableContext};
pub use dialect::{
    dialect_for_name, Dialect, GenericDialect, MySqlDialect, PostgresDialect, SqliteDialect,
};
pub use error::{CompileError, Result};
pub use executor::{Executor, Outcome, RowSet};
pub use expr::{col, CompareOp, Expr, LogicOp, MultiOp};
pub use hydrate::{hydrate, Record};
pub use join::{Join, JoinKind, ModelJoin, QueryJoin, Related};
pub use plan::{
    ColumnSlot, CountPlan, DeletePlan, InsertPlan, SelectPlan, Statement, StatementKind,
    UpdatePlan,
};
pub use query::{Assignments, Direction, Query};
pub use schema::{ColumnType, DatabaseMap, Metadata};
pub use value::{BindValue, SqlValue, ToSqlValue};

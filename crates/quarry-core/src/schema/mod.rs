//! Read-only table and column metadata.
//!
//! The compiler never inspects a live database. It resolves logical column
//! names through a [`Metadata`] implementation, usually a [`DatabaseMap`]
//! built in code or loaded from JSON (see [`config`]).

pub mod config;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// BOOLEAN
    Boolean,
    /// TINYINT
    TinyInt,
    /// SMALLINT
    SmallInt,
    /// INTEGER
    Integer,
    /// BIGINT
    BigInt,
    /// FLOAT / REAL
    Float,
    /// DOUBLE PRECISION
    Double,
    /// DECIMAL / NUMERIC
    Decimal,
    /// CHAR(n)
    Char,
    /// VARCHAR(n)
    Varchar,
    /// Long text (TEXT, LONGVARCHAR)
    LongVarchar,
    /// CLOB
    Clob,
    /// DATE
    Date,
    /// TIME
    Time,
    /// TIMESTAMP
    Timestamp,
    /// BINARY / VARBINARY
    Binary,
    /// BLOB
    Blob,
}

impl ColumnType {
    /// Whether values of this type are text, i.e. subject to case folding.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(
            self,
            Self::Char | Self::Varchar | Self::LongVarchar | Self::Clob
        )
    }

    /// Whether values of this type are dates and/or times.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Timestamp)
    }

    /// Whether this is the boolean type.
    #[must_use]
    pub const fn is_boolean(self) -> bool {
        matches!(self, Self::Boolean)
    }

    /// Whether values of this type are numbers.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::TinyInt
                | Self::SmallInt
                | Self::Integer
                | Self::BigInt
                | Self::Float
                | Self::Double
                | Self::Decimal
        )
    }

    /// Whether values of this type are raw bytes.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Binary | Self::Blob)
    }
}

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    name: String,
    field: String,
    column_type: ColumnType,
    primary_key: bool,
    nullable: bool,
}

impl ColumnMap {
    /// Creates a column with the given SQL name and type. The logical name
    /// defaults to the SQL name.
    #[must_use]
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: String::from(name),
            field: String::from(name),
            column_type,
            primary_key: false,
            nullable: false,
        }
    }

    /// Sets the logical (model-level) name, e.g. `AuthorId` for `author_id`.
    #[must_use]
    pub fn field(mut self, field: &str) -> Self {
        self.field = String::from(field);
        self
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The SQL column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logical column name.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field
    }

    /// The declared type.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Whether the column is part of the primary key.
    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn matches(&self, name: &str) -> bool {
        self.field == name || self.name.eq_ignore_ascii_case(name)
    }
}

/// A foreign-key relation from one table to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMap {
    name: String,
    foreign_table: String,
    mappings: Vec<(String, String)>,
}

impl RelationMap {
    /// Creates a relation named `name` pointing at `foreign_table`.
    #[must_use]
    pub fn new(name: &str, foreign_table: &str) -> Self {
        Self {
            name: String::from(name),
            foreign_table: String::from(foreign_table),
            mappings: Vec::new(),
        }
    }

    /// Adds a local-column to foreign-column mapping.
    #[must_use]
    pub fn on(mut self, local: &str, foreign: &str) -> Self {
        self.mappings.push((String::from(local), String::from(foreign)));
        self
    }

    /// The relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table the relation points at.
    #[must_use]
    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    /// `(local, foreign)` column pairs, in declaration order.
    #[must_use]
    pub fn mappings(&self) -> &[(String, String)] {
        &self.mappings
    }
}

/// Metadata for a table: its columns in declaration order and its
/// outgoing relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMap {
    name: String,
    columns: Vec<ColumnMap>,
    relations: Vec<RelationMap>,
}

impl TableMap {
    /// Creates an empty table map.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnMap) -> Self {
        self.columns.push(column);
        self
    }

    /// Appends a relation.
    #[must_use]
    pub fn relation(mut self, relation: RelationMap) -> Self {
        self.relations.push(relation);
        self
    }

    /// The SQL table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns, in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMap] {
        &self.columns
    }

    /// All relations.
    #[must_use]
    pub fn relations(&self) -> &[RelationMap] {
        &self.relations
    }

    /// Looks up a column by logical name, then by SQL name (ignoring case).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownColumn`] if no column matches.
    pub fn get_column(&self, name: &str) -> Result<&ColumnMap> {
        self.columns
            .iter()
            .find(|c| c.matches(name))
            .ok_or_else(|| CompileError::UnknownColumn {
                table: self.name.clone(),
                column: String::from(name),
            })
    }

    /// Looks up a relation by name.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownRelation`] if no relation matches.
    pub fn get_relation(&self, name: &str) -> Result<&RelationMap> {
        self.relations
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| CompileError::UnknownRelation {
                table: self.name.clone(),
                relation: String::from(name),
            })
    }
}

/// The lookup service the compiler consumes.
///
/// Implementations must be cheap to query and safe to share between
/// threads; the compiler only reads from them.
pub trait Metadata: fmt::Debug + Send + Sync {
    /// Returns the table map for a table name.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownTable`] if the table is not known.
    fn table(&self, name: &str) -> Result<Arc<TableMap>>;

    /// Resolves a column to its SQL name and declared type.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownTable`] or
    /// [`CompileError::UnknownColumn`].
    fn resolve_column(&self, table: &str, column: &str) -> Result<(String, ColumnType)> {
        let table = self.table(table)?;
        let column = table.get_column(column)?;
        Ok((String::from(column.name()), column.column_type()))
    }

    /// Returns the SQL name of a table.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownTable`] if the table is not known.
    fn table_sql_name(&self, table: &str) -> Result<String> {
        Ok(String::from(self.table(table)?.name()))
    }
}

/// In-memory [`Metadata`] for one database.
#[derive(Debug, Clone, Default)]
pub struct DatabaseMap {
    name: String,
    tables: Vec<Arc<TableMap>>,
}

impl DatabaseMap {
    /// Creates an empty database map.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            tables: Vec::new(),
        }
    }

    /// Adds a table.
    #[must_use]
    pub fn with_table(mut self, table: TableMap) -> Self {
        self.tables.push(Arc::new(table));
        self
    }

    /// The database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All tables, in insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &TableMap> {
        self.tables.iter().map(AsRef::as_ref)
    }

    /// Checks that every relation points at a known table and known columns.
    ///
    /// # Errors
    ///
    /// Returns the first unresolvable table or column.
    pub fn validate(&self) -> Result<()> {
        for table in &self.tables {
            for relation in table.relations() {
                let foreign = self.table_map(relation.foreign_table())?;
                for (local, remote) in relation.mappings() {
                    table.get_column(local)?;
                    foreign.get_column(remote)?;
                }
            }
        }
        Ok(())
    }

    fn table_map(&self, name: &str) -> Result<Arc<TableMap>> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| CompileError::UnknownTable(String::from(name)))
    }
}

impl Metadata for DatabaseMap {
    fn table(&self, name: &str) -> Result<Arc<TableMap>> {
        self.table_map(name)
    }
}

//! Loading schema metadata from JSON.
//!
//! ```json
//! {
//!   "name": "bookstore",
//!   "tables": [
//!     {
//!       "name": "book",
//!       "columns": [
//!         { "name": "id", "type": "integer", "primary_key": true },
//!         { "name": "author_id", "field": "AuthorId", "type": "integer" }
//!       ],
//!       "relations": [
//!         { "name": "Author", "foreign_table": "author",
//!           "columns": [{ "local": "author_id", "foreign": "id" }] }
//!       ]
//!     }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::{ColumnMap, ColumnType, DatabaseMap, RelationMap, TableMap};
use crate::error::{CompileError, Result};

/// Top-level schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Database name.
    pub name: String,
    /// Tables, in declaration order.
    pub tables: Vec<TableConfig>,
}

/// One table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// SQL table name.
    pub name: String,
    /// Columns, in declaration order.
    pub columns: Vec<ColumnConfig>,
    /// Outgoing relations.
    #[serde(default)]
    pub relations: Vec<RelationConfig>,
}

/// One column entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// SQL column name.
    pub name: String,
    /// Logical name; defaults to `name`.
    #[serde(default)]
    pub field: Option<String>,
    /// Declared type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub nullable: bool,
}

/// One relation entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationConfig {
    /// Relation name, e.g. `Author`.
    pub name: String,
    /// Target table.
    pub foreign_table: String,
    /// Column pairs.
    pub columns: Vec<ColumnPair>,
}

/// A local/foreign column pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPair {
    pub local: String,
    pub foreign: String,
}

impl From<SchemaConfig> for DatabaseMap {
    fn from(config: SchemaConfig) -> Self {
        config
            .tables
            .into_iter()
            .fold(Self::new(&config.name), |db, table| db.with_table(table.into()))
    }
}

impl From<TableConfig> for TableMap {
    fn from(config: TableConfig) -> Self {
        let mut table = Self::new(&config.name);
        for column in config.columns {
            table = table.column(column.into());
        }
        for relation in config.relations {
            table = table.relation(relation.into());
        }
        table
    }
}

impl From<ColumnConfig> for ColumnMap {
    fn from(config: ColumnConfig) -> Self {
        let mut column = Self::new(&config.name, config.column_type);
        if let Some(field) = &config.field {
            column = column.field(field);
        }
        if config.primary_key {
            column = column.primary_key();
        }
        if config.nullable {
            column = column.nullable();
        }
        column
    }
}

impl From<RelationConfig> for RelationMap {
    fn from(config: RelationConfig) -> Self {
        config
            .columns
            .iter()
            .fold(Self::new(&config.name, &config.foreign_table), |rel, pair| {
                rel.on(&pair.local, &pair.foreign)
            })
    }
}

impl DatabaseMap {
    /// Parses a JSON schema document and validates its relations.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Schema`] for malformed JSON, or the lookup
    /// error of the first relation that does not resolve.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SchemaConfig =
            serde_json::from_str(json).map_err(|e| CompileError::Schema(e.to_string()))?;
        let db = Self::from(config);
        db.validate()?;
        Ok(db)
    }
}

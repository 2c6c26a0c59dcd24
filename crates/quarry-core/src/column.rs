//! Table contexts and column references.

use std::fmt;
use std::sync::Arc;

use crate::dialect::Dialect;
use crate::error::{CompileError, Result};
use crate::schema::{ColumnMap, ColumnType, TableMap};

/// A table as it appears in one query: its metadata plus an optional alias.
///
/// Cloning is cheap; every [`ColumnRef`] built from a context shares it.
#[derive(Debug, Clone)]
pub struct TableContext {
    table: Arc<TableMap>,
    alias: Option<Arc<str>>,
}

impl TableContext {
    /// A context for `table` without alias.
    #[must_use]
    pub const fn new(table: Arc<TableMap>) -> Self {
        Self { table, alias: None }
    }

    /// A context for `table` under `alias`.
    #[must_use]
    pub fn aliased(table: Arc<TableMap>, alias: &str) -> Self {
        Self {
            table,
            alias: Some(Arc::from(alias)),
        }
    }

    /// The underlying table metadata.
    #[must_use]
    pub fn table_map(&self) -> &TableMap {
        &self.table
    }

    /// SQL table name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.table.name()
    }

    /// The alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name columns are qualified with.
    #[must_use]
    pub fn alias_or_name(&self) -> &str {
        self.alias().unwrap_or_else(|| self.name())
    }

    /// `name` or `name alias`, as written in FROM and JOIN.
    #[must_use]
    pub fn from_clause_sql(&self) -> String {
        match self.alias() {
            Some(alias) => format!("{} {alias}", self.name()),
            None => String::from(self.name()),
        }
    }

    /// Identity used to deduplicate FROM entries.
    #[must_use]
    pub fn key(&self) -> (&str, Option<&str>) {
        (self.name(), self.alias())
    }

    /// Resolves a column of this table by logical or SQL name.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownColumn`] if the name does not resolve.
    pub fn column(&self, name: &str) -> Result<ColumnRef> {
        let column = self.table.get_column(name)?;
        Ok(ColumnRef {
            table: self.clone(),
            column: column.clone(),
        })
    }

    /// Every column of the table, in declaration order.
    #[must_use]
    pub fn all_columns(&self) -> Vec<ColumnRef> {
        self.table
            .columns()
            .iter()
            .map(|column| ColumnRef {
                table: self.clone(),
                column: column.clone(),
            })
            .collect()
    }
}

impl PartialEq for TableContext {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for TableContext {}

/// A resolved, qualified column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    table: TableContext,
    column: ColumnMap,
}

impl ColumnRef {
    /// The table context the column belongs to.
    #[must_use]
    pub const fn table(&self) -> &TableContext {
        &self.table
    }

    /// Column metadata.
    #[must_use]
    pub const fn column(&self) -> &ColumnMap {
        &self.column
    }

    /// SQL column name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.column.name()
    }

    /// Declared column type.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column.column_type()
    }

    /// Whether the column holds text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        self.column.column_type().is_text()
    }

    /// `<alias-or-name>.<column>`.
    #[must_use]
    pub fn qualified_sql(&self) -> String {
        format!("{}.{}", self.table.alias_or_name(), self.column.name())
    }

    /// The dialect's case fold around [`Self::qualified_sql`] for textual
    /// columns; the plain qualified name otherwise.
    #[must_use]
    pub fn ignore_case_sql(&self, dialect: &dyn Dialect) -> String {
        let sql = self.qualified_sql();
        if self.is_text() {
            dialect.ignore_case(&sql)
        } else {
            sql
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table.alias_or_name(), self.column.name())
    }
}

/// A column as given to a builder: already resolved, or a name resolved
/// when the statement is compiled.
///
/// Names are looked up on the expression's table context. A dotted name
/// (`author.LastName`) selects the table by alias or name among the
/// tables of the enclosing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    Resolved(ColumnRef),
    Named(String),
}

impl ColumnTarget {
    /// Resolves the target.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnboundColumn`] when a bare name has no table to
    /// resolve against, [`CompileError::UnknownTable`] when a dotted prefix
    /// matches no source, [`CompileError::UnknownColumn`] otherwise.
    pub fn resolve(
        &self,
        table: Option<&TableContext>,
        sources: &[TableContext],
    ) -> Result<ColumnRef> {
        match self {
            Self::Resolved(column) => Ok(column.clone()),
            Self::Named(name) => match name.split_once('.') {
                Some((prefix, column)) => sources
                    .iter()
                    .chain(table)
                    .find(|t| t.alias_or_name().eq_ignore_ascii_case(prefix))
                    .ok_or_else(|| CompileError::UnknownTable(String::from(prefix)))?
                    .column(column),
                None => table
                    .ok_or_else(|| CompileError::UnboundColumn(name.clone()))?
                    .column(name),
            },
        }
    }
}

impl From<ColumnRef> for ColumnTarget {
    fn from(column: ColumnRef) -> Self {
        Self::Resolved(column)
    }
}

impl From<&ColumnRef> for ColumnTarget {
    fn from(column: &ColumnRef) -> Self {
        Self::Resolved(column.clone())
    }
}

impl From<&str> for ColumnTarget {
    fn from(name: &str) -> Self {
        Self::Named(String::from(name))
    }
}

impl From<String> for ColumnTarget {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// An entry of the SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectColumn {
    /// Every column of a table, in declaration order.
    All(TableContext),
    /// One column.
    Column(ColumnTarget),
    /// Verbatim SQL, e.g. an aggregate.
    Raw(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDialect;

    fn book() -> Arc<TableMap> {
        Arc::new(
            TableMap::new("book")
                .column(ColumnMap::new("id", ColumnType::Integer).field("Id"))
                .column(ColumnMap::new("title", ColumnType::Varchar).field("Title")),
        )
    }

    #[test]
    fn test_qualified_sql_uses_alias() {
        let plain = TableContext::new(book());
        let aliased = TableContext::aliased(book(), "b");
        assert_eq!(plain.column("Title").unwrap().qualified_sql(), "book.title");
        assert_eq!(aliased.column("Title").unwrap().qualified_sql(), "b.title");
        assert_eq!(aliased.from_clause_sql(), "book b");
        assert_ne!(plain, aliased);
    }

    #[test]
    fn test_ignore_case_only_folds_text() {
        let ctx = TableContext::new(book());
        let dialect = GenericDialect::new();
        assert_eq!(
            ctx.column("Title").unwrap().ignore_case_sql(&dialect),
            "UPPER(book.title)"
        );
        assert_eq!(ctx.column("Id").unwrap().ignore_case_sql(&dialect), "book.id");
    }

    #[test]
    fn test_unknown_column() {
        let ctx = TableContext::new(book());
        assert_eq!(
            ctx.column("Isbn"),
            Err(CompileError::UnknownColumn {
                table: String::from("book"),
                column: String::from("Isbn"),
            })
        );
    }

    #[test]
    fn test_resolve_named_targets() {
        let ctx = TableContext::aliased(book(), "b");
        let sources = [ctx.clone()];

        let bare = ColumnTarget::from("Title").resolve(Some(&ctx), &sources).unwrap();
        assert_eq!(bare.qualified_sql(), "b.title");

        let dotted = ColumnTarget::from("b.id").resolve(None, &sources).unwrap();
        assert_eq!(dotted.qualified_sql(), "b.id");

        assert_eq!(
            ColumnTarget::from("Title").resolve(None, &sources),
            Err(CompileError::UnboundColumn(String::from("Title")))
        );
        assert_eq!(
            ColumnTarget::from("x.id").resolve(None, &sources),
            Err(CompileError::UnknownTable(String::from("x")))
        );
    }
}

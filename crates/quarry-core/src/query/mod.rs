//! The query builder.
//!
//! A [`Query`] collects a primary source, a WHERE tree, joins and the usual
//! SELECT modifiers. It is compiled into purpose-specific plans
//! ([`SelectPlan`](crate::SelectPlan), [`CountPlan`](crate::CountPlan),
//! [`InsertPlan`](crate::InsertPlan), [`UpdatePlan`](crate::UpdatePlan),
//! [`DeletePlan`](crate::DeletePlan));
//! compiling never changes the query.

mod compile;

use std::sync::Arc;

use crate::column::{ColumnRef, ColumnTarget, SelectColumn, TableContext};
use crate::error::{CompileError, Result};
use crate::expr::Expr;
use crate::join::{Join, JoinKind, ModelJoin, QueryJoin};
use crate::schema::{ColumnMap, Metadata, TableMap};
use crate::value::{SqlValue, ToSqlValue};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// `ASC` or `DESC`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// An ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderTarget {
    Column(ColumnTarget),
    /// Verbatim SQL, never case folded.
    Raw(String),
}

/// Where rows come from.
#[derive(Debug, Clone)]
pub(crate) enum Source {
    Table(TableContext),
    /// A nested query used as a table. `context` describes the derived
    /// table's columns under the alias.
    SubQuery {
        query: Box<Query>,
        context: TableContext,
    },
}

impl Source {
    pub(crate) const fn context(&self) -> &TableContext {
        match self {
            Self::Table(context) | Self::SubQuery { context, .. } => context,
        }
    }
}

/// Column values of an UPDATE or INSERT, in the order given.
#[derive(Debug, Clone, Default)]
pub struct Assignments {
    entries: Vec<(ColumnTarget, SqlValue)>,
}

impl Assignments {
    /// No assignments.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets `column` to `value`. A NULL value is written inline.
    #[must_use]
    pub fn set<T: ToSqlValue>(mut self, column: impl Into<ColumnTarget>, value: T) -> Self {
        self.entries.push((column.into(), value.to_sql_value()));
        self
    }

    /// Whether nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[(ColumnTarget, SqlValue)] {
        &self.entries
    }
}

/// A query under construction.
#[derive(Debug, Clone)]
pub struct Query {
    metadata: Arc<dyn Metadata>,
    source: Source,
    filter: Expr,
    joins: Vec<QueryJoin>,
    select: Vec<SelectColumn>,
    distinct: bool,
    group_by: Vec<ColumnTarget>,
    having: Option<Expr>,
    order_by: Vec<(OrderTarget, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
    ignore_case: bool,
}

impl Query {
    fn with_source(metadata: Arc<dyn Metadata>, source: Source) -> Self {
        Self {
            metadata,
            source,
            filter: Expr::all([]),
            joins: Vec::new(),
            select: Vec::new(),
            distinct: false,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            ignore_case: false,
        }
    }

    /// A query over `table`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownTable`] if the table is not known.
    pub fn from_table(metadata: Arc<dyn Metadata>, table: &str) -> Result<Self> {
        let context = TableContext::new(metadata.table(table)?);
        Ok(Self::with_source(metadata, Source::Table(context)))
    }

    /// A query over `table` under `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownTable`] if the table is not known.
    pub fn from_table_as(metadata: Arc<dyn Metadata>, table: &str, alias: &str) -> Result<Self> {
        let context = TableContext::aliased(metadata.table(table)?, alias);
        Ok(Self::with_source(metadata, Source::Table(context)))
    }

    /// A query over the rows of `inner`, which appears in FROM as
    /// `(<inner>) AS alias`. Columns of the derived table are the columns
    /// `inner` selects.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MissingSubQueryAlias`] for an empty alias, or
    /// the error raised while resolving the inner SELECT list.
    pub fn from_subquery(inner: Self, alias: &str) -> Result<Self> {
        if alias.trim().is_empty() {
            return Err(CompileError::MissingSubQueryAlias);
        }
        let derived = inner
            .selected_columns()?
            .into_iter()
            .fold(TableMap::new(alias), |table, column| {
                table.column(
                    ColumnMap::new(column.name(), column.column_type())
                        .field(column.column().field_name()),
                )
            });
        let context = TableContext::new(Arc::new(derived));
        let metadata = Arc::clone(&inner.metadata);
        Ok(Self::with_source(
            metadata,
            Source::SubQuery {
                query: Box::new(inner),
                context,
            },
        ))
    }

    /// The metadata the query resolves names against.
    #[must_use]
    pub fn metadata(&self) -> &Arc<dyn Metadata> {
        &self.metadata
    }

    /// The primary table, or the derived table of a sub-query source.
    #[must_use]
    pub const fn primary(&self) -> &TableContext {
        self.source.context()
    }

    /// A context for another table of the same database, e.g. to build a
    /// [`Join`].
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownTable`] if the table is not known.
    pub fn table(&self, name: &str) -> Result<TableContext> {
        Ok(TableContext::new(self.metadata.table(name)?))
    }

    /// Like [`Self::table`], under an alias.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownTable`] if the table is not known.
    pub fn table_as(&self, name: &str, alias: &str) -> Result<TableContext> {
        Ok(TableContext::aliased(self.metadata.table(name)?, alias))
    }

    /// A column of the primary table.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownColumn`] if the name does not resolve.
    pub fn column(&self, name: &str) -> Result<ColumnRef> {
        self.primary().column(name)
    }

    /// AND-s `expr` into the WHERE tree.
    #[must_use]
    pub fn filter(mut self, expr: Expr) -> Self {
        self.filter = self.filter.push(expr);
        self
    }

    /// The WHERE tree.
    #[must_use]
    pub const fn where_expr(&self) -> &Expr {
        &self.filter
    }

    /// Adds a join.
    #[must_use]
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(QueryJoin::Plain(join));
        self
    }

    /// Adds a relation join. Its `previous` index refers to this query's
    /// join list.
    #[must_use]
    pub fn model_join(mut self, join: ModelJoin) -> Self {
        self.joins.push(QueryJoin::Model(join));
        self
    }

    /// The joins, in insertion order.
    #[must_use]
    pub fn joins(&self) -> &[QueryJoin] {
        &self.joins
    }

    /// Joins along a dotted relation path starting at the primary table,
    /// e.g. `"Book.Author"` from `review`. Hops already joined by an
    /// earlier call are reused.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownRelation`], [`CompileError::UnknownTable`]
    /// or [`CompileError::UnknownColumn`] for a hop that does not resolve.
    pub fn join_relation(self, path: &str, kind: JoinKind) -> Result<Self> {
        self.join_relation_inner(path, None, kind)
    }

    /// Like [`Self::join_relation`], with `alias` on the last hop's table.
    ///
    /// # Errors
    ///
    /// Same as [`Self::join_relation`].
    pub fn join_relation_as(self, path: &str, alias: &str, kind: JoinKind) -> Result<Self> {
        self.join_relation_inner(path, Some(alias), kind)
    }

    fn join_relation_inner(
        mut self,
        path: &str,
        alias: Option<&str>,
        kind: JoinKind,
    ) -> Result<Self> {
        let hops: Vec<&str> = path.split('.').collect();
        let mut left = self.primary().clone();
        let mut previous: Option<usize> = None;
        for (depth, relation_name) in hops.iter().enumerate() {
            let last = depth + 1 == hops.len();
            let existing = self.joins.iter().position(|join| {
                join.as_model().is_some_and(|model| {
                    model.relation() == *relation_name
                        && model.previous() == previous
                        && model.join().left_table() == &left
                })
            });
            if let (Some(index), false) = (existing, last && alias.is_some()) {
                left = self.joins[index].join().right_table().clone();
                previous = Some(index);
                continue;
            }

            let relation = left.table_map().get_relation(relation_name)?.clone();
            let foreign = self.metadata.table(relation.foreign_table())?;
            let right = match (last, alias) {
                (true, Some(alias)) => TableContext::aliased(foreign, alias),
                _ => TableContext::new(foreign),
            };
            let mut pairs = relation.mappings().iter();
            let Some((local, remote)) = pairs.next() else {
                return Err(CompileError::UnknownRelation {
                    table: String::from(left.name()),
                    relation: String::from(*relation_name),
                });
            };
            let mut join = Join::new(left.column(local)?, right.column(remote)?, kind);
            for (local, remote) in pairs {
                join = join.and_on(left.column(local)?, right.column(remote)?);
            }
            let mut model = ModelJoin::new(join, relation_name);
            if let Some(index) = previous {
                model = model.after(index);
            }
            tracing::debug!(relation = %relation_name, table = %right.alias_or_name(), "join relation");
            self.joins.push(QueryJoin::Model(model));
            previous = Some(self.joins.len() - 1);
            left = right;
        }
        Ok(self)
    }

    /// Adds a column to the SELECT list.
    #[must_use]
    pub fn select(mut self, column: impl Into<ColumnTarget>) -> Self {
        self.select.push(SelectColumn::Column(column.into()));
        self
    }

    /// Adds every column of `table` to the SELECT list.
    #[must_use]
    pub fn select_all(mut self, table: &TableContext) -> Self {
        self.select.push(SelectColumn::All(table.clone()));
        self
    }

    /// Adds verbatim SQL to the SELECT list.
    #[must_use]
    pub fn select_raw(mut self, sql: &str) -> Self {
        self.select.push(SelectColumn::Raw(String::from(sql)));
        self
    }

    /// Selects the primary table's columns followed by those of every
    /// joined table, in join order. This is the layout hydration expects.
    #[must_use]
    pub fn select_with_joins(mut self) -> Self {
        let primary = self.primary().clone();
        self.select.push(SelectColumn::All(primary));
        let joined: Vec<TableContext> = self
            .joins
            .iter()
            .map(|join| join.join().right_table().clone())
            .collect();
        for table in joined {
            self.select.push(SelectColumn::All(table));
        }
        self
    }

    /// Adds DISTINCT.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds a GROUP BY column.
    #[must_use]
    pub fn group_by(mut self, column: impl Into<ColumnTarget>) -> Self {
        self.group_by.push(column.into());
        self
    }

    /// AND-s `expr` into the HAVING tree.
    #[must_use]
    pub fn having(mut self, expr: Expr) -> Self {
        self.having = Some(match self.having.take() {
            Some(having) => having.and(expr),
            None => Expr::all([expr]),
        });
        self
    }

    /// Adds an ORDER BY column.
    #[must_use]
    pub fn order_by(mut self, column: impl Into<ColumnTarget>, direction: Direction) -> Self {
        self.order_by
            .push((OrderTarget::Column(column.into()), direction));
        self
    }

    /// Adds a verbatim ORDER BY entry.
    #[must_use]
    pub fn order_by_raw(mut self, sql: &str, direction: Direction) -> Self {
        self.order_by
            .push((OrderTarget::Raw(String::from(sql)), direction));
        self
    }

    /// Adds a LIMIT clause.
    #[must_use]
    pub const fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Adds an OFFSET clause.
    #[must_use]
    pub const fn offset(mut self, n: u64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Makes textual comparisons, implicit join conditions and ORDER BY
    /// entries case-insensitive, unless an expression sets its own value.
    #[must_use]
    pub const fn ignore_case(mut self, flag: bool) -> Self {
        self.ignore_case = flag;
        self
    }

    pub(crate) const fn has_limit_or_offset(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}

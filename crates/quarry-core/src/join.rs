//! Joins and relation chains.

use crate::column::{ColumnRef, TableContext};
use crate::dialect::Dialect;
use crate::error::{CompileError, Result};

/// How two tables are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Both tables in FROM, the condition in WHERE.
    Implicit,
    Inner,
    Left,
    Right,
}

impl JoinKind {
    /// The JOIN keyword, or `None` for implicit joins.
    #[must_use]
    pub const fn keyword(self) -> Option<&'static str> {
        match self {
            Self::Implicit => None,
            Self::Inner => Some("INNER JOIN"),
            Self::Left => Some("LEFT JOIN"),
            Self::Right => Some("RIGHT JOIN"),
        }
    }
}

/// An equi-join between two tables, on one or more column pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    conditions: Vec<(ColumnRef, ColumnRef)>,
    kind: JoinKind,
}

impl Join {
    /// Joins on `left = right`.
    #[must_use]
    pub fn new(left: ColumnRef, right: ColumnRef, kind: JoinKind) -> Self {
        Self {
            conditions: vec![(left, right)],
            kind,
        }
    }

    /// Adds a column pair, AND-ed with the others.
    #[must_use]
    pub fn and_on(mut self, left: ColumnRef, right: ColumnRef) -> Self {
        self.conditions.push((left, right));
        self
    }

    /// The join kind.
    #[must_use]
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Left column of the first pair.
    #[must_use]
    pub fn left(&self) -> &ColumnRef {
        &self.conditions[0].0
    }

    /// Right column of the first pair.
    #[must_use]
    pub fn right(&self) -> &ColumnRef {
        &self.conditions[0].1
    }

    /// The table on the left side.
    #[must_use]
    pub fn left_table(&self) -> &TableContext {
        self.left().table()
    }

    /// The table on the right side.
    #[must_use]
    pub fn right_table(&self) -> &TableContext {
        self.right().table()
    }

    /// `l=r` pairs joined by ` AND `. With `ignore_case`, textual columns
    /// are folded on both sides.
    #[must_use]
    pub fn condition_sql(&self, dialect: &dyn Dialect, ignore_case: bool) -> String {
        self.conditions
            .iter()
            .map(|(left, right)| {
                if ignore_case {
                    format!(
                        "{}={}",
                        left.ignore_case_sql(dialect),
                        right.ignore_case_sql(dialect)
                    )
                } else {
                    format!("{}={}", left.qualified_sql(), right.qualified_sql())
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// `<KIND> JOIN <right table> ON (<condition>)`, or `None` for implicit
    /// joins.
    #[must_use]
    pub fn clause_sql(&self, dialect: &dyn Dialect) -> Option<String> {
        self.kind.keyword().map(|keyword| {
            format!(
                "{keyword} {} ON ({})",
                self.right_table().from_clause_sql(),
                // ON conditions compare as written; ignore-case only folds implicit joins.
                self.condition_sql(dialect, false)
            )
        })
    }
}

/// Navigation between hydrated objects along named relations.
pub trait Related {
    /// The object attached under `relation`, if any.
    fn related(&self, relation: &str) -> Option<&Self>;

    /// Mutable access to the object attached under `relation`, if any.
    fn related_mut(&mut self, relation: &str) -> Option<&mut Self>;
}

/// A join that follows a named relation, optionally continuing the chain of
/// an earlier join of the same query.
///
/// `previous` is the index, in the owning query's join list, of the
/// [`ModelJoin`] this one continues. `None` means the chain starts at the
/// query's primary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelJoin {
    join: Join,
    relation: String,
    previous: Option<usize>,
}

impl ModelJoin {
    /// A join following `relation` from the primary table.
    #[must_use]
    pub fn new(join: Join, relation: &str) -> Self {
        Self {
            join,
            relation: String::from(relation),
            previous: None,
        }
    }

    /// Continues the chain of the join at `index`.
    #[must_use]
    pub const fn after(mut self, index: usize) -> Self {
        self.previous = Some(index);
        self
    }

    /// The underlying join.
    #[must_use]
    pub const fn join(&self) -> &Join {
        &self.join
    }

    /// Relation name.
    #[must_use]
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Index of the join this one continues.
    #[must_use]
    pub const fn previous(&self) -> Option<usize> {
        self.previous
    }

    /// Relation names from the primary table down to the object this join
    /// attaches to.
    fn relation_path<'c>(&self, chain: &'c [QueryJoin]) -> Result<Vec<&'c str>> {
        let mut path = Vec::new();
        let mut previous = self.previous;
        while let Some(index) = previous {
            if path.len() >= chain.len() {
                return Err(CompileError::InvalidJoinChain(format!(
                    "cycle through join #{index}"
                )));
            }
            let link = chain
                .get(index)
                .and_then(QueryJoin::as_model)
                .ok_or_else(|| {
                    CompileError::InvalidJoinChain(format!(
                        "join #{index} is not a relation join of this query"
                    ))
                })?;
            path.push(link.relation.as_str());
            previous = link.previous;
        }
        path.reverse();
        Ok(path)
    }

    /// The object that a record hydrated for this join should be attached
    /// to: `start` for a chain root, otherwise the object reached from
    /// `start` through the relations of the previous joins.
    ///
    /// Returns `Ok(None)` when an intermediate object is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidJoinChain`] when a `previous` link is
    /// out of range, is not a relation join, or forms a cycle.
    pub fn object_to_relate<'a, T: Related>(
        &self,
        chain: &[QueryJoin],
        start: &'a T,
    ) -> Result<Option<&'a T>> {
        let mut current = start;
        for relation in self.relation_path(chain)? {
            let Some(next) = current.related(relation) else {
                return Ok(None);
            };
            current = next;
        }
        Ok(Some(current))
    }

    /// Mutable variant of [`Self::object_to_relate`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::object_to_relate`].
    pub fn object_to_relate_mut<'a, T: Related>(
        &self,
        chain: &[QueryJoin],
        start: &'a mut T,
    ) -> Result<Option<&'a mut T>> {
        let mut current = start;
        for relation in self.relation_path(chain)? {
            let Some(next) = current.related_mut(relation) else {
                return Ok(None);
            };
            current = next;
        }
        Ok(Some(current))
    }
}

/// An entry of a query's join list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryJoin {
    Plain(Join),
    Model(ModelJoin),
}

impl QueryJoin {
    /// The underlying join.
    #[must_use]
    pub const fn join(&self) -> &Join {
        match self {
            Self::Plain(join) => join,
            Self::Model(model) => &model.join,
        }
    }

    /// The relation join, if this is one.
    #[must_use]
    pub const fn as_model(&self) -> Option<&ModelJoin> {
        match self {
            Self::Plain(_) => None,
            Self::Model(model) => Some(model),
        }
    }
}

impl From<Join> for QueryJoin {
    fn from(join: Join) -> Self {
        Self::Plain(join)
    }
}

impl From<ModelJoin> for QueryJoin {
    fn from(join: ModelJoin) -> Self {
        Self::Model(join)
    }
}

/// Checks that every relation join continues an earlier relation join.
///
/// # Errors
///
/// Returns [`CompileError::InvalidJoinChain`] for the first broken link.
pub fn validate_chain(joins: &[QueryJoin]) -> Result<()> {
    for (index, join) in joins.iter().enumerate() {
        let Some(previous) = join.as_model().and_then(ModelJoin::previous) else {
            continue;
        };
        if previous >= index {
            return Err(CompileError::InvalidJoinChain(format!(
                "join #{index} continues join #{previous}, which does not precede it"
            )));
        }
        if joins[previous].as_model().is_none() {
            return Err(CompileError::InvalidJoinChain(format!(
                "join #{index} continues join #{previous}, which is not a relation join"
            )));
        }
    }
    Ok(())
}

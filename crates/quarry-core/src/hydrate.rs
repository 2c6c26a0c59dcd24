//! Turning flat result rows into nested records.
//!
//! A row of a [`SelectPlan`] is split by table: the primary table's columns
//! form the root [`Record`], and the columns of each relation join form a
//! record attached under the relation name to the object the join chain
//! leads to.

use std::collections::BTreeMap;

use crate::column::TableContext;
use crate::error::Result;
use crate::join::Related;
use crate::plan::{ColumnSlot, SelectPlan};
use crate::value::SqlValue;

/// One hydrated row of one table, with its related records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    table: String,
    values: Vec<(String, SqlValue)>,
    related: BTreeMap<String, Record>,
}

impl Record {
    /// An empty record for `table`.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: String::from(table),
            values: Vec::new(),
            related: BTreeMap::new(),
        }
    }

    /// Table alias or name the record was read from.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The value of a column, by logical name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// `(logical name, value)` pairs in SELECT order.
    #[must_use]
    pub fn values(&self) -> &[(String, SqlValue)] {
        &self.values
    }

    /// Names of the attached relations.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.related.keys().map(String::as_str)
    }

    /// Attaches `record` under `relation`, replacing any previous one.
    pub fn attach(&mut self, relation: &str, record: Self) {
        self.related.insert(String::from(relation), record);
    }

    fn push(&mut self, field: &str, value: SqlValue) {
        self.values.push((String::from(field), value));
    }
}

impl Related for Record {
    fn related(&self, relation: &str) -> Option<&Self> {
        self.related.get(relation)
    }

    fn related_mut(&mut self, relation: &str) -> Option<&mut Self> {
        self.related.get_mut(relation)
    }
}

fn slice(plan: &SelectPlan, row: &[SqlValue], table: &TableContext) -> Record {
    let mut record = Record::new(table.alias_or_name());
    for (slot, value) in plan.layout().iter().zip(row) {
        if let ColumnSlot::Column(column) = slot {
            if column.table() == table {
                record.push(column.column().field_name(), value.clone());
            }
        }
    }
    record
}

/// Whether a joined table found no row. Its selected primary key columns
/// decide; without any, every selected column must be NULL.
fn unmatched(plan: &SelectPlan, row: &[SqlValue], table: &TableContext) -> bool {
    let selected: Vec<(bool, &SqlValue)> = plan
        .layout()
        .iter()
        .zip(row)
        .filter_map(|(slot, value)| match slot {
            ColumnSlot::Column(column) if column.table() == table => {
                Some((column.column().is_primary_key(), value))
            }
            _ => None,
        })
        .collect();
    if selected.iter().any(|(key, _)| *key) {
        selected
            .iter()
            .filter(|(key, _)| *key)
            .all(|(_, value)| value.is_null())
    } else {
        selected.iter().all(|(_, value)| value.is_null())
    }
}

/// Builds the record graph of one result row.
///
/// Relation joins whose columns are absent from the SELECT list, or whose
/// primary key is NULL (an unmatched LEFT JOIN), attach nothing.
///
/// # Errors
///
/// Returns [`crate::CompileError::InvalidJoinChain`] for a broken chain.
pub fn hydrate(plan: &SelectPlan, row: &[SqlValue]) -> Result<Record> {
    let mut root = slice(plan, row, plan.primary());
    for join in plan.joins() {
        let Some(model) = join.as_model() else {
            continue;
        };
        let table = model.join().right_table();
        if unmatched(plan, row, table) {
            continue;
        }
        let record = slice(plan, row, table);
        if let Some(target) = model.object_to_relate_mut(plan.joins(), &mut root)? {
            target.attach(model.relation(), record);
        }
    }
    Ok(root)
}

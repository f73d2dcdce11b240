// ============================================================================
// Change Log
// ============================================================================
//
// One live change per (row, column). Last write wins for the new value, the
// first write wins for the baseline.
//
// ============================================================================

use super::{Change, EditOutcome};
use crate::core::{Row, RowId, Value};
use chrono::Utc;
use std::collections::BTreeMap;

type CellKey = (RowId, String);

#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    entries: BTreeMap<CellKey, Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit of `column` in `row_id`.
    ///
    /// `displayed` is the value the grid currently shows for the cell; it only
    /// becomes the baseline when no live change exists for the key yet.
    /// Re-entering the pending value only refreshes its timestamp.
    pub fn record_edit(
        &mut self,
        row_id: &RowId,
        column: &str,
        displayed: &Value,
        new_value: Value,
    ) -> EditOutcome {
        let key = (row_id.clone(), column.to_string());

        if let Some(existing) = self.entries.get_mut(&key) {
            if existing.old_value == new_value {
                self.entries.remove(&key);
                return EditOutcome::Reverted;
            }
            let unchanged = existing.new_value == new_value;
            existing.new_value = new_value;
            existing.timestamp = Utc::now();
            return if unchanged { EditOutcome::Unchanged } else { EditOutcome::Updated };
        }

        if *displayed == new_value {
            return EditOutcome::Unchanged;
        }

        let change = Change::new(row_id.clone(), column, displayed.clone(), new_value);
        self.entries.insert(key, change);
        EditOutcome::Recorded
    }

    /// Drop one live change, returning it so the caller can restore the baseline.
    pub fn revert(&mut self, row_id: &RowId, column: &str) -> Option<Change> {
        self.entries.remove(&(row_id.clone(), column.to_string()))
    }

    pub fn get(&self, row_id: &RowId, column: &str) -> Option<&Change> {
        self.entries.get(&(row_id.clone(), column.to_string()))
    }

    /// Live changes in stable (row, column) order.
    pub fn list(&self) -> Vec<&Change> {
        self.entries.values().collect()
    }

    pub fn changes_for_row<'a>(&'a self, row_id: &'a RowId) -> impl Iterator<Item = &'a Change> + 'a {
        self.entries
            .range((row_id.clone(), String::new())..)
            .take_while(move |((id, _), _)| id == row_id)
            .map(|(_, change)| change)
    }

    /// Overwrite `row`'s cells with the live changes recorded for it.
    pub fn overlay(&self, row: &mut Row) {
        let row_id = row.id.clone();
        for change in self.changes_for_row(&row_id) {
            row.set(change.column.clone(), change.new_value.clone());
        }
    }

    pub fn has_row(&self, row_id: &RowId) -> bool {
        self.changes_for_row(row_id).next().is_some()
    }

    /// Distinct rows with at least one live change.
    pub fn rows(&self) -> Vec<RowId> {
        let mut rows: Vec<RowId> = Vec::new();
        for (id, _) in self.entries.keys() {
            if rows.last() != Some(id) {
                rows.push(id.clone());
            }
        }
        rows
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ============================================================================
// Edit Tracker
// ============================================================================
//
// Owns the change log, the modified-row index and the server baseline of
// every row with a live change. All mutations go through here so the log
// and the index never disagree.
//
// ============================================================================

use super::{Change, ChangeLog, EditOutcome, ModifiedRowIndex};
use crate::core::{Row, RowId, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct EditTracker {
    log: ChangeLog,
    modified: ModifiedRowIndex,
    baselines: HashMap<RowId, Row>,
}

impl EditTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit against `server_row`, the unedited row as last fetched.
    /// `displayed` is what the grid shows for the cell right now.
    pub fn record_edit(
        &mut self,
        server_row: &Row,
        column: &str,
        displayed: &Value,
        new_value: Value,
    ) -> EditOutcome {
        let row_id = &server_row.id;
        let outcome = self.log.record_edit(row_id, column, displayed, new_value);

        match outcome {
            EditOutcome::Recorded | EditOutcome::Updated => {
                self.baselines
                    .entry(row_id.clone())
                    .or_insert_with(|| server_row.clone());
                self.modified.mark_modified(row_id.clone());
            }
            EditOutcome::Reverted => self.forget_if_clean(row_id),
            EditOutcome::Unchanged => {}
        }

        outcome
    }

    pub fn revert(&mut self, row_id: &RowId, column: &str) -> Option<Change> {
        let change = self.log.revert(row_id, column)?;
        self.forget_if_clean(row_id);
        Some(change)
    }

    fn forget_if_clean(&mut self, row_id: &RowId) {
        if !self.log.has_row(row_id) {
            self.baselines.remove(row_id);
            self.modified.unmark_pending(row_id);
        }
    }

    /// Overlay live changes onto `row` in place.
    pub fn overlay(&self, row: &mut Row) {
        self.log.overlay(row);
    }

    /// Full row objects (all columns) for every row with a live change.
    pub fn staged_rows(&self) -> Vec<Row> {
        self.log
            .rows()
            .into_iter()
            .filter_map(|id| {
                let mut row = self.baselines.get(&id)?.clone();
                self.overlay(&mut row);
                Some(row)
            })
            .collect()
    }

    /// Stage succeeded: pending rows are now in temporary storage.
    pub fn mark_staged(&mut self) {
        self.log.clear();
        self.baselines.clear();
        self.modified.promote_pending();
    }

    /// Abandon unsaved edits; previously staged rows stay modified.
    pub fn discard(&mut self) {
        self.log.clear();
        self.baselines.clear();
        self.modified.clear_pending();
    }

    /// Commit succeeded: nothing is modified any more.
    pub fn reset(&mut self) {
        self.log.clear();
        self.baselines.clear();
        self.modified.clear();
    }

    pub fn seed_staged(&mut self, rows: impl IntoIterator<Item = RowId>) {
        self.modified.seed_staged(rows);
    }

    pub fn log(&self) -> &ChangeLog {
        &self.log
    }

    pub fn modified(&self) -> &ModifiedRowIndex {
        &self.modified
    }

    pub fn has_pending(&self) -> bool {
        !self.log.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, status: &str) -> Row {
        Row::new(id).with("status", status).with("qty", 1i64)
    }

    #[test]
    fn test_edit_marks_row_modified() {
        let mut tracker = EditTracker::new();
        let r1 = row("r1", "pending");
        tracker.record_edit(&r1, "status", r1.get("status"), "active".into());

        assert!(tracker.modified().query(&r1.id));
        assert_eq!(tracker.log().len(), 1);
    }

    #[test]
    fn test_revert_unmarks_row_without_other_changes() {
        let mut tracker = EditTracker::new();
        let r1 = row("r1", "pending");
        tracker.record_edit(&r1, "status", r1.get("status"), "active".into());
        tracker.record_edit(&r1, "qty", r1.get("qty"), 5i64.into());

        tracker.revert(&r1.id, "status");
        assert!(tracker.modified().query(&r1.id));

        tracker.record_edit(&r1, "qty", &5i64.into(), 1i64.into());
        assert!(!tracker.modified().query(&r1.id));
        assert!(tracker.staged_rows().is_empty());
    }

    #[test]
    fn test_staged_rows_are_full_rows() {
        let mut tracker = EditTracker::new();
        let r1 = row("r1", "pending");
        tracker.record_edit(&r1, "status", r1.get("status"), "active".into());

        let rows = tracker.staged_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("status"), &Value::from("active"));
        assert_eq!(rows[0].get("qty"), &Value::Integer(1));
    }

    #[test]
    fn test_mark_staged_clears_log_keeps_index() {
        let mut tracker = EditTracker::new();
        let r1 = row("r1", "pending");
        tracker.record_edit(&r1, "status", r1.get("status"), "active".into());
        tracker.mark_staged();

        assert!(!tracker.has_pending());
        assert!(tracker.modified().is_staged(&r1.id));

        tracker.reset();
        assert!(tracker.modified().is_empty());
    }
}

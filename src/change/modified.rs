use crate::core::RowId;
use std::collections::BTreeSet;

/// Rows considered touched: rows with live changes plus rows already sitting
/// in temporary storage. Staging moves rows from `pending` to `staged`; only a
/// commit empties `staged`.
#[derive(Debug, Clone, Default)]
pub struct ModifiedRowIndex {
    pending: BTreeSet<RowId>,
    staged: BTreeSet<RowId>,
}

impl ModifiedRowIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_modified(&mut self, row_id: RowId) {
        self.pending.insert(row_id);
    }

    pub fn mark_staged(&mut self, row_id: RowId) {
        self.pending.remove(&row_id);
        self.staged.insert(row_id);
    }

    /// Seed from rows the backend reports as already staged.
    pub fn seed_staged(&mut self, rows: impl IntoIterator<Item = RowId>) {
        self.staged.extend(rows);
    }

    pub fn unmark_pending(&mut self, row_id: &RowId) {
        self.pending.remove(row_id);
    }

    pub fn promote_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.staged.extend(pending);
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.staged.clear();
    }

    pub fn query(&self, row_id: &RowId) -> bool {
        self.pending.contains(row_id) || self.staged.contains(row_id)
    }

    pub fn is_staged(&self, row_id: &RowId) -> bool {
        self.staged.contains(row_id)
    }

    pub fn count(&self) -> usize {
        self.staged.len() + self.pending.difference(&self.staged).count()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.staged.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowId> {
        self.staged.union(&self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_semantics() {
        let mut index = ModifiedRowIndex::new();
        index.seed_staged([RowId::new("r1"), RowId::new("r2")]);
        index.mark_modified(RowId::new("r2"));
        index.mark_modified(RowId::new("r3"));

        assert_eq!(index.count(), 3);
        assert!(index.query(&RowId::new("r1")));
        assert!(!index.query(&RowId::new("r4")));
        assert_eq!(index.iter().count(), 3);
    }

    #[test]
    fn test_promote_then_clear_pending_keeps_staged() {
        let mut index = ModifiedRowIndex::new();
        index.mark_modified(RowId::new("r1"));
        index.promote_pending();
        index.mark_modified(RowId::new("r2"));
        index.clear_pending();

        assert!(index.is_staged(&RowId::new("r1")));
        assert!(!index.query(&RowId::new("r2")));
        assert_eq!(index.count(), 1);

        index.clear();
        assert!(index.is_empty());
    }
}

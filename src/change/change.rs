// ============================================================================
// Cell Change
// ============================================================================
//
// A pending edit of one cell. `old_value` is the baseline from before the
// first edit of the unsaved sequence, so reverting always lands on the value
// the row had when editing started.
//
// ============================================================================

use crate::core::{RowId, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub row_id: RowId,
    pub column: String,
    pub old_value: Value,
    pub new_value: Value,
    pub timestamp: DateTime<Utc>,
}

impl Change {
    pub fn new(row_id: RowId, column: impl Into<String>, old_value: Value, new_value: Value) -> Self {
        Self {
            row_id,
            column: column.into(),
            old_value,
            new_value,
            timestamp: Utc::now(),
        }
    }

    /// Key identifying the cell this change applies to
    pub fn key(&self) -> (&RowId, &str) {
        (&self.row_id, &self.column)
    }

    /// True if applying the change would leave the cell at its baseline
    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}

/// Result of recording an edit in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// First edit of this cell; a new live change was created.
    Recorded,
    /// An existing live change was overwritten, baseline kept.
    Updated,
    /// The cell was edited back to its baseline and the live change dropped.
    Reverted,
    /// Value equals what is displayed and nothing was pending.
    Unchanged,
}

impl EditOutcome {
    /// Whether the change log was mutated.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

// ============================================================================
// Change Tracking
// ============================================================================
//
// - `change.rs`   - single-cell change record and edit outcomes
// - `log.rs`      - change log keyed by (row, column)
// - `modified.rs` - modified-row index (pending ∪ staged)
// - `tracker.rs`  - keeps the two above in lockstep
//
// ============================================================================

mod change;
mod log;
mod modified;
mod tracker;

pub use change::{Change, EditOutcome};
pub use log::ChangeLog;
pub use modified::ModifiedRowIndex;
pub use tracker::EditTracker;

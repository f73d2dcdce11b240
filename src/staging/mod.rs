// ============================================================================
// Staging & Commit Protocol
// ============================================================================
//
// Two-phase persistence:
//
//   stage   pending edits ──> temporary storage   (change log cleared,
//                                                  rows stay modified)
//   commit  temporary storage ──> dataset         (everything cleared)
//
// Commit is gated on repair completeness: every row of the full dataset must
// be staged. Failures leave local state exactly as it was so the caller can
// retry.
//
// ============================================================================

use crate::change::EditTracker;
use crate::core::{DatasetId, GridError, Result};
use crate::store::{RowStore, StagedInfo, with_deadline};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReceipt {
    pub rows_staged: usize,
    pub staged: StagedInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub rows_committed: usize,
}

pub struct StagingProtocol {
    store: Arc<dyn RowStore>,
    dataset_id: DatasetId,
    timeout: Option<Duration>,
    staged: StagedInfo,
}

impl StagingProtocol {
    pub fn new(store: Arc<dyn RowStore>, dataset_id: DatasetId, timeout: Option<Duration>) -> Self {
        Self {
            store,
            dataset_id,
            timeout,
            staged: StagedInfo::default(),
        }
    }

    /// Pull what temporary storage holds from an earlier session and mark
    /// those rows modified.
    pub async fn load(&mut self, tracker: &mut EditTracker) -> Result<&StagedInfo> {
        let info = with_deadline(self.timeout, self.store.staged_info(&self.dataset_id)).await?;
        tracker.seed_staged(info.staged_row_ids.iter().cloned());
        self.staged = info;
        Ok(&self.staged)
    }

    /// Send every row with a live change to temporary storage.
    ///
    /// All or nothing: the change log is cleared only after the backend
    /// accepted the whole batch.
    pub async fn stage(&mut self, tracker: &mut EditTracker) -> Result<StageReceipt> {
        if !tracker.has_pending() {
            return Err(GridError::NothingToStage);
        }

        let rows = tracker.staged_rows();
        let rows_staged = rows.len();
        let row_ids: Vec<_> = rows.iter().map(|r| r.id.clone()).collect();

        let result = with_deadline(self.timeout, self.store.stage_changes(&self.dataset_id, rows)).await;
        if let Err(err) = result {
            warn!(dataset = %self.dataset_id, error = %err, "stage failed, change log kept");
            return Err(match err {
                GridError::StageFailed(_) => err,
                other => GridError::StageFailed(other.to_string()),
            });
        }

        tracker.mark_staged();
        self.refresh_staged(row_ids).await;
        info!(
            dataset = %self.dataset_id,
            rows = rows_staged,
            repaired = self.staged.repaired_count,
            total = self.staged.total_row_count,
            "changes staged"
        );

        Ok(StageReceipt {
            rows_staged,
            staged: self.staged.clone(),
        })
    }

    /// Re-read staged info after a stage. If the backend cannot answer, fold
    /// the just-staged ids into the local copy instead.
    async fn refresh_staged(&mut self, row_ids: Vec<crate::core::RowId>) {
        match with_deadline(self.timeout, self.store.staged_info(&self.dataset_id)).await {
            Ok(info) => self.staged = info,
            Err(err) => {
                warn!(dataset = %self.dataset_id, error = %err, "staged info refresh failed, using local count");
                for id in row_ids {
                    if !self.staged.staged_row_ids.contains(&id) {
                        self.staged.staged_row_ids.push(id);
                    }
                }
                self.staged.repaired_count = self.staged.staged_row_ids.len();
            }
        }
    }

    /// True iff every row of the full dataset is staged.
    pub fn can_commit(&self) -> bool {
        self.staged.is_complete()
    }

    /// Apply temporary storage to the dataset. Rejected without a backend call
    /// while `can_commit` is false.
    pub async fn commit(&mut self, tracker: &mut EditTracker) -> Result<CommitReceipt> {
        if !self.can_commit() {
            return Err(GridError::CommitNotAllowed {
                repaired: self.staged.repaired_count,
                total: self.staged.total_row_count,
            });
        }

        let result = with_deadline(self.timeout, self.store.commit_staged(&self.dataset_id)).await;
        if let Err(err) = result {
            warn!(dataset = %self.dataset_id, error = %err, "commit failed, staged rows kept");
            return Err(match err {
                GridError::CommitFailed(_) => err,
                other => GridError::CommitFailed(other.to_string()),
            });
        }

        let rows_committed = self.staged.repaired_count;
        tracker.reset();
        self.staged = StagedInfo {
            repaired_count: 0,
            total_row_count: self.staged.total_row_count,
            staged_row_ids: Vec::new(),
        };
        info!(dataset = %self.dataset_id, rows = rows_committed, "staged changes committed");

        Ok(CommitReceipt { rows_committed })
    }

    /// Drop unsaved edits. Temporary storage is left alone. Returns how many
    /// live changes were dropped.
    pub fn discard(&self, tracker: &mut EditTracker) -> usize {
        let dropped = tracker.log().len();
        tracker.discard();
        dropped
    }

    pub fn staged_info(&self) -> &StagedInfo {
        &self.staged
    }

    /// Keep the declared total in step with refreshed dataset metadata.
    pub fn set_total_row_count(&mut self, total: usize) {
        self.staged.total_row_count = total;
    }
}

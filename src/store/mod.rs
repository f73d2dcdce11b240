//! Row store contract.
//!
//! The editor core never talks to storage directly; it goes through a
//! [`RowStore`]. Fetches must be idempotent and side-effect free. Staging and
//! committing take whole rows, never per-cell diffs.

mod memory;

pub use memory::{InMemoryRowStore, StoreOp};

use crate::core::{Column, DatasetId, DatasetMeta, Result, Row, RowId};
use crate::view::{Filter, SortSpec, ViewParams};
use crate::core::GridError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    pub dataset_id: DatasetId,
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub filters: Vec<Filter>,
}

impl PageRequest {
    pub fn new(dataset_id: DatasetId, params: &ViewParams) -> Self {
        Self {
            dataset_id,
            page: params.page,
            page_size: params.page_size,
            sort: params.sort.clone(),
            filters: params.filters.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Rows matching the filters, across all pages
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// What temporary storage currently holds for a dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedInfo {
    pub repaired_count: usize,
    pub total_row_count: usize,
    pub staged_row_ids: Vec<RowId>,
}

impl StagedInfo {
    /// Every row of the full dataset has been repaired. An unknown (zero)
    /// total never qualifies.
    pub fn is_complete(&self) -> bool {
        self.total_row_count > 0 && self.repaired_count >= self.total_row_count
    }
}

#[async_trait]
pub trait RowStore: Send + Sync {
    async fn fetch_dataset(&self, dataset_id: &DatasetId) -> Result<DatasetMeta>;

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page>;

    /// Write full rows to temporary storage. Restaging a row replaces it.
    async fn stage_changes(&self, dataset_id: &DatasetId, rows: Vec<Row>) -> Result<()>;

    /// Apply everything in temporary storage to the dataset and clear it.
    async fn commit_staged(&self, dataset_id: &DatasetId) -> Result<()>;

    async fn staged_info(&self, dataset_id: &DatasetId) -> Result<StagedInfo>;
}

/// Run a backend call under an optional deadline.
pub async fn with_deadline<T, F>(timeout: Option<Duration>, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| GridError::Timeout(millis(limit)))?,
        None => call.await,
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

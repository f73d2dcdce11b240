// ============================================================================
// In-Memory Row Store
// ============================================================================
//
// Explicit store object holding datasets and their temporary (staged) rows.
// Page fetches read staged rows in place of committed ones, so repairs stay
// visible across reloads before they are committed. Fault injection, latency
// and call counters exist for exercising failure paths.
//
// ============================================================================

use super::{Page, PageRequest, RowStore, StagedInfo};
use crate::core::{DatasetId, DatasetMeta, GridError, Result, Row, RowId, Value};
use crate::view::{matches_all, sort_rows};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FetchDataset,
    FetchPage,
    Stage,
    Commit,
    StagedInfo,
}

impl StoreOp {
    fn failure(&self, dataset_id: &DatasetId) -> GridError {
        let msg = format!("injected failure for dataset '{}'", dataset_id);
        match self {
            Self::Stage => GridError::StageFailed(msg),
            Self::Commit => GridError::CommitFailed(msg),
            Self::FetchDataset | Self::FetchPage | Self::StagedInfo => GridError::FetchFailed(msg),
        }
    }
}

struct DatasetEntry {
    meta: DatasetMeta,
    rows: Vec<Row>,
    staged: BTreeMap<RowId, Row>,
}

#[derive(Default)]
pub struct InMemoryRowStore {
    datasets: RwLock<HashMap<DatasetId, DatasetEntry>>,
    faults: Mutex<HashSet<StoreOp>>,
    latency: Mutex<HashMap<StoreOp, Duration>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset. The declared row count is taken from `rows`.
    pub async fn create_dataset(&self, mut meta: DatasetMeta, rows: Vec<Row>) -> Result<()> {
        let mut datasets = self.datasets.write().await;
        if datasets.contains_key(&meta.id) {
            return Err(GridError::InvalidParameter(format!("dataset '{}' already exists", meta.id)));
        }

        meta.row_count = rows.len();
        datasets.insert(
            meta.id.clone(),
            DatasetEntry {
                meta,
                rows,
                staged: BTreeMap::new(),
            },
        );
        Ok(())
    }

    /// Append rows, assigning fresh identifiers. Returns the new ids.
    pub async fn insert_rows(
        &self,
        dataset_id: &DatasetId,
        rows: Vec<BTreeMap<String, Value>>,
    ) -> Result<Vec<RowId>> {
        let mut datasets = self.datasets.write().await;
        let entry = datasets
            .get_mut(dataset_id)
            .ok_or_else(|| GridError::dataset_not_found(dataset_id.as_str()))?;

        let mut ids = Vec::with_capacity(rows.len());
        for values in rows {
            let id = RowId::generate();
            entry.rows.push(Row { id: id.clone(), values });
            ids.push(id);
        }
        entry.meta.row_count = entry.rows.len();
        entry.meta.last_modified = Utc::now();
        Ok(ids)
    }

    /// Current (committed) rows of a dataset, in insertion order.
    pub async fn rows(&self, dataset_id: &DatasetId) -> Result<Vec<Row>> {
        let datasets = self.datasets.read().await;
        datasets
            .get(dataset_id)
            .map(|entry| entry.rows.clone())
            .ok_or_else(|| GridError::dataset_not_found(dataset_id.as_str()))
    }

    pub async fn staged_rows(&self, dataset_id: &DatasetId) -> Result<Vec<Row>> {
        let datasets = self.datasets.read().await;
        datasets
            .get(dataset_id)
            .map(|entry| entry.staged.values().cloned().collect())
            .ok_or_else(|| GridError::dataset_not_found(dataset_id.as_str()))
    }

    /// Make the next call of `op` fail without touching any state.
    pub async fn fail_next(&self, op: StoreOp) {
        self.faults.lock().await.insert(op);
    }

    pub async fn set_latency(&self, op: StoreOp, latency: Duration) {
        self.latency.lock().await.insert(op, latency);
    }

    pub async fn call_count(&self, op: StoreOp) -> usize {
        self.calls.lock().await.get(&op).copied().unwrap_or(0)
    }

    /// Bookkeeping shared by every operation: count, delay, injected fault.
    async fn enter(&self, op: StoreOp, dataset_id: &DatasetId) -> Result<()> {
        *self.calls.lock().await.entry(op).or_insert(0) += 1;

        let latency = self.latency.lock().await.get(&op).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.faults.lock().await.remove(&op) {
            debug!(?op, dataset = %dataset_id, "injected store failure");
            return Err(op.failure(dataset_id));
        }
        Ok(())
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn fetch_dataset(&self, dataset_id: &DatasetId) -> Result<DatasetMeta> {
        self.enter(StoreOp::FetchDataset, dataset_id).await?;

        let datasets = self.datasets.read().await;
        datasets
            .get(dataset_id)
            .map(|entry| entry.meta.clone())
            .ok_or_else(|| GridError::dataset_not_found(dataset_id.as_str()))
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<Page> {
        self.enter(StoreOp::FetchPage, &request.dataset_id).await?;

        if request.page == 0 || request.page_size == 0 {
            return Err(GridError::InvalidParameter("page and page size must be positive".into()));
        }

        let datasets = self.datasets.read().await;
        let entry = datasets
            .get(&request.dataset_id)
            .ok_or_else(|| GridError::dataset_not_found(request.dataset_id.as_str()))?;

        // Staged rows shadow their committed versions until commit
        let mut matching: Vec<Row> = entry
            .rows
            .iter()
            .map(|row| entry.staged.get(&row.id).unwrap_or(row))
            .filter(|row| matches_all(&request.filters, row))
            .cloned()
            .collect();

        if let Some(sort) = &request.sort {
            sort_rows(&mut matching, sort);
        }

        let total_rows = matching.len();
        let total_pages = total_rows.div_ceil(request.page_size).max(1);
        // An offset past usize::MAX is past the last page
        let rows = match (request.page - 1).checked_mul(request.page_size) {
            Some(offset) => matching.into_iter().skip(offset).take(request.page_size).collect(),
            None => Vec::new(),
        };

        Ok(Page {
            columns: entry.meta.columns.clone(),
            rows,
            total_rows,
            page: request.page,
            page_size: request.page_size,
            total_pages,
        })
    }

    async fn stage_changes(&self, dataset_id: &DatasetId, rows: Vec<Row>) -> Result<()> {
        self.enter(StoreOp::Stage, dataset_id).await?;

        let mut datasets = self.datasets.write().await;
        let entry = datasets
            .get_mut(dataset_id)
            .ok_or_else(|| GridError::dataset_not_found(dataset_id.as_str()))?;

        // Validate the whole batch first so a bad row stages nothing
        if let Some(unknown) = rows.iter().find(|row| !entry.rows.iter().any(|r| r.id == row.id)) {
            return Err(GridError::row_not_found(unknown.id.as_str()));
        }

        for row in rows {
            entry.staged.insert(row.id.clone(), row);
        }
        debug!(dataset = %dataset_id, staged = entry.staged.len(), "rows staged");
        Ok(())
    }

    async fn commit_staged(&self, dataset_id: &DatasetId) -> Result<()> {
        self.enter(StoreOp::Commit, dataset_id).await?;

        let mut datasets = self.datasets.write().await;
        let entry = datasets
            .get_mut(dataset_id)
            .ok_or_else(|| GridError::dataset_not_found(dataset_id.as_str()))?;

        let staged = std::mem::take(&mut entry.staged);
        let committed = staged.len();
        for row in entry.rows.iter_mut() {
            if let Some(replacement) = staged.get(&row.id) {
                *row = replacement.clone();
            }
        }

        entry.meta.repaired_count = committed;
        entry.meta.last_modified = Utc::now();
        debug!(dataset = %dataset_id, committed, "staged rows committed");
        Ok(())
    }

    async fn staged_info(&self, dataset_id: &DatasetId) -> Result<StagedInfo> {
        self.enter(StoreOp::StagedInfo, dataset_id).await?;

        let datasets = self.datasets.read().await;
        let entry = datasets
            .get(dataset_id)
            .ok_or_else(|| GridError::dataset_not_found(dataset_id.as_str()))?;

        Ok(StagedInfo {
            repaired_count: entry.staged.len(),
            total_row_count: entry.meta.row_count,
            staged_row_ids: entry.staged.keys().cloned().collect(),
        })
    }
}

// ============================================================================
// Editor Session
// ============================================================================
//
// One editing session over one dataset. Control flow:
//
//   parameter change ─> fetch ─> reconcile pending edits ─> render
//   cell edit        ─> change log + modified-row index ─> re-render
//   stage            ─> temporary storage, change log cleared
//   commit           ─> only when every row is repaired
//
// Page loads are split into issue / fetch / apply so several fetches can be
// in flight at once; only the latest one is ever applied.
//
// ============================================================================

use crate::change::{Change, EditOutcome, EditTracker, ModifiedRowIndex};
use crate::config::SessionConfig;
use crate::core::{Column, DatasetId, DatasetMeta, GridError, Result, Row, RowId, Value};
use crate::prefs::{PreferenceStore, ViewPreferences};
use crate::staging::{CommitReceipt, StageReceipt, StagingProtocol};
use crate::store::{Page, RowStore, StagedInfo, with_deadline};
use crate::validation::{ValidationEngine, ValidationReport};
use crate::view::{FetchTicket, Filter, LoadOutcome, SortSpec, ViewController, ViewParams, ViewState};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which rows a bulk edit touches.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkTarget {
    Rows(Vec<RowId>),
    VisiblePage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Staged(StageReceipt),
    /// Pre-stage validation found errors; nothing was sent.
    ValidationFailed(ValidationReport),
}

pub struct EditorSession {
    store: Arc<dyn RowStore>,
    config: SessionConfig,
    meta: DatasetMeta,
    view: ViewController,
    tracker: EditTracker,
    staging: StagingProtocol,
    validator: ValidationEngine,
    prefs: Option<Arc<dyn PreferenceStore>>,
}

impl EditorSession {
    /// Open a dataset: metadata, previously staged rows, then the first page.
    pub async fn open(store: Arc<dyn RowStore>, dataset_id: DatasetId, config: SessionConfig) -> Result<Self> {
        Self::open_with_preferences(store, dataset_id, config, None).await
    }

    pub async fn open_with_preferences(
        store: Arc<dyn RowStore>,
        dataset_id: DatasetId,
        config: SessionConfig,
        prefs: Option<Arc<dyn PreferenceStore>>,
    ) -> Result<Self> {
        let meta = with_deadline(config.request_timeout, store.fetch_dataset(&dataset_id)).await?;

        let mut params = ViewParams::new(config.page_size);
        if config.persist_preferences {
            if let Some(saved) = prefs.as_ref().map(|p| p.load(&dataset_id)).transpose()?.flatten() {
                if let Some(page_size) = saved.page_size.filter(|size| *size > 0) {
                    params.page_size = page_size;
                }
                params.sort = saved.sort;
            }
        }

        let mut tracker = EditTracker::new();
        let mut staging = StagingProtocol::new(Arc::clone(&store), dataset_id.clone(), config.request_timeout);
        staging.load(&mut tracker).await?;

        let mut session = Self {
            store,
            config,
            meta,
            view: ViewController::new(dataset_id, params),
            tracker,
            staging,
            validator: ValidationEngine::new(),
            prefs,
        };
        info!(
            dataset = %session.meta.id,
            rows = session.meta.row_count,
            staged = session.staging.staged_info().repaired_count,
            "dataset opened"
        );

        session.reload().await?;
        Ok(session)
    }

    // ------------------------------------------------------------------
    // Split-phase loading
    // ------------------------------------------------------------------

    pub fn set_page(&mut self, page: usize) -> Result<FetchTicket> {
        self.view.set_page(page)
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<FetchTicket> {
        self.view.set_page_size(page_size)
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> Result<FetchTicket> {
        self.view.set_sort(sort)
    }

    pub fn set_filters(&mut self, filters: Vec<Filter>) -> Result<FetchTicket> {
        self.view.set_filters(filters)
    }

    pub fn refresh(&mut self) -> Result<FetchTicket> {
        self.view.refresh()
    }

    /// Fetch the page a ticket asks for. The future owns everything it
    /// needs, so it can run while the session issues newer tickets.
    pub fn fetch(&self, ticket: &FetchTicket) -> impl Future<Output = Result<Page>> + Send + use<> {
        let store = Arc::clone(&self.store);
        let request = ticket.request.clone();
        let timeout = self.config.request_timeout;
        async move { with_deadline(timeout, store.fetch_page(&request)).await }
    }

    /// Apply a fetch result. Results of superseded tickets are dropped.
    pub fn apply(&mut self, ticket: &FetchTicket, result: Result<Page>) -> LoadOutcome {
        self.view.resolve(ticket, result, self.tracker.log())
    }

    async fn load(&mut self, ticket: FetchTicket) -> Result<LoadOutcome> {
        let result = self.fetch(&ticket).await;
        match self.apply(&ticket, result) {
            LoadOutcome::Failed(err) => Err(err),
            outcome => Ok(outcome),
        }
    }

    pub async fn reload(&mut self) -> Result<LoadOutcome> {
        let ticket = self.view.refresh()?;
        self.load(ticket).await
    }

    pub async fn go_to_page(&mut self, page: usize) -> Result<LoadOutcome> {
        let ticket = self.view.set_page(page)?;
        self.load(ticket).await
    }

    pub async fn change_page_size(&mut self, page_size: usize) -> Result<LoadOutcome> {
        let ticket = self.view.set_page_size(page_size)?;
        self.save_preferences();
        self.load(ticket).await
    }

    pub async fn sort_by(&mut self, sort: Option<SortSpec>) -> Result<LoadOutcome> {
        let ticket = self.view.set_sort(sort)?;
        self.save_preferences();
        self.load(ticket).await
    }

    pub async fn toggle_sort(&mut self, column: &str) -> Result<LoadOutcome> {
        let ticket = self.view.toggle_sort(column)?;
        self.save_preferences();
        self.load(ticket).await
    }

    pub async fn filter_by(&mut self, filters: Vec<Filter>) -> Result<LoadOutcome> {
        let ticket = self.view.set_filters(filters)?;
        self.load(ticket).await
    }

    fn save_preferences(&self) {
        if !self.config.persist_preferences {
            return;
        }
        let Some(prefs) = &self.prefs else {
            return;
        };

        let params = self.view.params();
        let snapshot = ViewPreferences {
            page_size: Some(params.page_size),
            sort: params.sort.clone(),
        };
        if let Err(err) = prefs.save(&self.meta.id, &snapshot) {
            warn!(dataset = %self.meta.id, error = %err, "could not save view preferences");
        }
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    fn editable_column(&self, column: &str) -> Result<&Column> {
        self.meta
            .column(column)
            .ok_or_else(|| GridError::column_not_found(column))
    }

    /// Edit one visible cell.
    pub fn edit_cell(&mut self, row_id: &RowId, column: &str, value: Value) -> Result<EditOutcome> {
        let data_type = self.editable_column(column)?.data_type;
        if !data_type.is_compatible(&value) {
            return Err(GridError::InvalidParameter(format!(
                "column '{}' expects {}, got {}",
                column,
                data_type,
                value.type_name()
            )));
        }

        let server_row = self
            .view
            .server_row(row_id)
            .ok_or_else(|| GridError::row_not_found(row_id.as_str()))?;
        let displayed = self
            .view
            .displayed_value(row_id, column)
            .cloned()
            .unwrap_or(Value::Null);

        let outcome = self.tracker.record_edit(server_row, column, &displayed, value);
        if outcome.is_mutation() {
            self.view.reconcile(self.tracker.log());
            debug!(row = %row_id, column, ?outcome, "cell edited");
        }
        Ok(outcome)
    }

    /// Edit a cell from raw grid input, parsed by the column's declared type.
    pub fn edit_cell_text(&mut self, row_id: &RowId, column: &str, raw: &str) -> Result<EditOutcome> {
        let value = self.editable_column(column)?.data_type.parse(raw)?;
        self.edit_cell(row_id, column, value)
    }

    /// Undo a pending edit back to the cell's baseline.
    pub fn revert_cell(&mut self, row_id: &RowId, column: &str) -> Option<Change> {
        let change = self.tracker.revert(row_id, column)?;
        self.view.reconcile(self.tracker.log());
        Some(change)
    }

    /// Set `column` to `value` on every targeted row. Every target must be
    /// visible or nothing is edited. Returns how many cells changed.
    pub fn bulk_edit(&mut self, column: &str, value: Value, target: BulkTarget) -> Result<usize> {
        let data_type = self.editable_column(column)?.data_type;
        if !data_type.is_compatible(&value) {
            return Err(GridError::InvalidParameter(format!(
                "column '{}' expects {}, got {}",
                column,
                data_type,
                value.type_name()
            )));
        }

        let targets: Vec<Row> = match target {
            BulkTarget::VisiblePage => self.view.rows().to_vec(),
            BulkTarget::Rows(ids) => ids
                .iter()
                .map(|id| {
                    self.view
                        .row(id)
                        .cloned()
                        .ok_or_else(|| GridError::row_not_found(id.as_str()))
                })
                .collect::<Result<_>>()?,
        };

        let mut changed = 0;
        for rendered in &targets {
            let Some(server_row) = self.view.server_row(&rendered.id) else {
                continue;
            };
            let outcome = self
                .tracker
                .record_edit(server_row, column, rendered.get(column), value.clone());
            if outcome.is_mutation() {
                changed += 1;
            }
        }

        if changed > 0 {
            self.view.reconcile(self.tracker.log());
        }
        debug!(column, changed, targets = targets.len(), "bulk edit applied");
        Ok(changed)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Stage all pending edits.
    pub async fn stage(&mut self) -> Result<StageOutcome> {
        if !self.tracker.has_pending() {
            return Err(GridError::NothingToStage);
        }

        if self.config.validate_before_stage {
            let report = self.validator.validate(&self.tracker.staged_rows(), &self.meta.columns);
            if !report.is_valid {
                warn!(dataset = %self.meta.id, errors = report.error_count(), "stage refused by validation");
                return Ok(StageOutcome::ValidationFailed(report));
            }
        }

        let receipt = self.staging.stage(&mut self.tracker).await?;
        self.refresh_meta().await;
        self.reload_quietly().await;
        Ok(StageOutcome::Staged(receipt))
    }

    pub fn can_commit(&self) -> bool {
        self.staging.can_commit()
    }

    /// Commit temporary storage to the dataset.
    pub async fn commit(&mut self) -> Result<CommitReceipt> {
        let receipt = self.staging.commit(&mut self.tracker).await?;
        self.refresh_meta().await;
        self.reload_quietly().await;
        Ok(receipt)
    }

    /// Abandon unsaved edits and reload the current page.
    pub async fn discard(&mut self) -> Result<LoadOutcome> {
        let dropped = self.staging.discard(&mut self.tracker);
        debug!(dataset = %self.meta.id, dropped, "pending edits discarded");
        self.view.reconcile(self.tracker.log());
        self.reload().await
    }

    async fn refresh_meta(&mut self) {
        match with_deadline(self.config.request_timeout, self.store.fetch_dataset(&self.meta.id)).await {
            Ok(meta) => {
                self.staging.set_total_row_count(meta.row_count);
                self.meta = meta;
            }
            Err(err) => warn!(dataset = %self.meta.id, error = %err, "metadata refresh failed"),
        }
    }

    /// Reload after a successful write; the write stands even if this fails.
    async fn reload_quietly(&mut self) {
        if let Err(err) = self.reload().await {
            warn!(dataset = %self.meta.id, error = %err, "reload after write failed");
        }
    }

    // ------------------------------------------------------------------
    // Validation & accessors
    // ------------------------------------------------------------------

    /// Validate the rows currently on screen, pending edits included.
    pub fn validate(&self) -> ValidationReport {
        self.validator.validate(self.view.rows(), &self.meta.columns)
    }

    pub fn rows(&self) -> &[Row] {
        self.view.rows()
    }

    pub fn row(&self, row_id: &RowId) -> Option<&Row> {
        self.view.row(row_id)
    }

    pub fn state(&self) -> &ViewState {
        self.view.state()
    }

    pub fn params(&self) -> &ViewParams {
        self.view.params()
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    pub fn changes(&self) -> Vec<&Change> {
        self.tracker.log().list()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.tracker.has_pending()
    }

    pub fn modified(&self) -> &ModifiedRowIndex {
        self.tracker.modified()
    }

    pub fn is_modified(&self, row_id: &RowId) -> bool {
        self.tracker.modified().query(row_id)
    }

    pub fn meta(&self) -> &DatasetMeta {
        &self.meta
    }

    pub fn staged_info(&self) -> &StagedInfo {
        self.staging.staged_info()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

// ============================================================================
// View State Controller
// ============================================================================
//
// Owns the paging/sort/filter parameters and the visible page. Every
// parameter change bumps the request generation; results are applied only
// when they carry the current generation, so out-of-order completions of
// superseded requests are dropped on arrival.
//
// ============================================================================

use super::{Filter, FetchTicket, LoadOutcome, SortSpec, ViewParams, ViewState};
use crate::change::ChangeLog;
use crate::core::{Column, DatasetId, GridError, Result, Row, RowId, Value};
use crate::store::{Page, PageRequest};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ViewController {
    dataset_id: DatasetId,
    params: ViewParams,
    state: ViewState,
    generation: u64,
    columns: Vec<Column>,
    /// Rows exactly as the backend returned them
    server_rows: Vec<Row>,
    /// `server_rows` with pending edits overlaid; what the grid renders
    rows: Vec<Row>,
    total_rows: usize,
    total_pages: usize,
}

impl ViewController {
    pub fn new(dataset_id: DatasetId, params: ViewParams) -> Self {
        Self {
            dataset_id,
            params,
            state: ViewState::Idle,
            generation: 0,
            columns: Vec::new(),
            server_rows: Vec::new(),
            rows: Vec::new(),
            total_rows: 0,
            total_pages: 0,
        }
    }

    /// Issue a fetch for the current parameters.
    pub fn refresh(&mut self) -> Result<FetchTicket> {
        self.params.validate()?;

        self.generation += 1;
        self.state = ViewState::Loading;

        let ticket = FetchTicket {
            generation: self.generation,
            request: PageRequest::new(self.dataset_id.clone(), &self.params),
        };
        debug!(generation = ticket.generation, page = self.params.page, "page fetch issued");
        Ok(ticket)
    }

    pub fn set_page(&mut self, page: usize) -> Result<FetchTicket> {
        if page == 0 {
            return Err(GridError::InvalidParameter("page is 1-based".into()));
        }
        self.params.page = page;
        self.refresh()
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<FetchTicket> {
        if page_size == 0 {
            return Err(GridError::InvalidParameter("page size must be positive".into()));
        }
        self.params.page_size = page_size;
        self.params.page = 1;
        self.refresh()
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> Result<FetchTicket> {
        self.params.sort = sort;
        self.params.page = 1;
        self.refresh()
    }

    /// Sort by `column`, flipping direction if it is already the sort column.
    pub fn toggle_sort(&mut self, column: &str) -> Result<FetchTicket> {
        let next = match &self.params.sort {
            Some(current) if current.column == column => SortSpec {
                column: current.column.clone(),
                direction: current.direction.reversed(),
            },
            _ => SortSpec::asc(column),
        };
        self.set_sort(Some(next))
    }

    pub fn set_filters(&mut self, filters: Vec<Filter>) -> Result<FetchTicket> {
        self.params.filters = filters;
        self.params.page = 1;
        self.refresh()
    }

    pub fn add_filter(&mut self, filter: Filter) -> Result<FetchTicket> {
        let mut filters = self.params.filters.clone();
        filters.push(filter);
        self.set_filters(filters)
    }

    pub fn clear_filters(&mut self) -> Result<FetchTicket> {
        self.set_filters(Vec::new())
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Apply the result of a fetch issued as `ticket`.
    pub fn resolve(&mut self, ticket: &FetchTicket, result: Result<Page>, log: &ChangeLog) -> LoadOutcome {
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "dropping superseded page result"
            );
            return LoadOutcome::Superseded { generation: ticket.generation };
        }

        match result {
            Ok(page) => {
                self.columns = page.columns;
                self.server_rows = page.rows;
                self.total_rows = page.total_rows;
                self.total_pages = page.total_pages;
                self.state = ViewState::Loaded;
                self.reconcile(log);
                LoadOutcome::Applied { rows: self.rows.len() }
            }
            Err(err) => {
                warn!(generation = ticket.generation, error = %err, "page fetch failed, keeping stale rows");
                self.state = ViewState::Error(err.to_string());
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Rebuild the rendered rows from the fetched rows plus live changes.
    pub fn reconcile(&mut self, log: &ChangeLog) {
        self.rows = self
            .server_rows
            .iter()
            .map(|row| {
                let mut rendered = row.clone();
                log.overlay(&mut rendered);
                rendered
            })
            .collect();
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, row_id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| &r.id == row_id)
    }

    pub fn server_row(&self, row_id: &RowId) -> Option<&Row> {
        self.server_rows.iter().find(|r| &r.id == row_id)
    }

    pub fn displayed_value(&self, row_id: &RowId, column: &str) -> Option<&Value> {
        self.row(row_id).map(|r| r.get(column))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn params(&self) -> &ViewParams {
        &self.params
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn dataset_id(&self) -> &DatasetId {
        &self.dataset_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn page(ids: &[&str], status: &str) -> Page {
        Page {
            columns: vec![Column::new("status", DataType::String)],
            rows: ids.iter().map(|id| Row::new(*id).with("status", status)).collect(),
            total_rows: ids.len(),
            page: 1,
            page_size: 10,
            total_pages: 1,
        }
    }

    fn controller() -> ViewController {
        ViewController::new(DatasetId::new("ds"), ViewParams::new(10))
    }

    #[test]
    fn test_param_changes_reset_page() {
        let mut view = controller();
        view.set_page(4).unwrap();
        let ticket = view.set_page_size(25).unwrap();
        assert_eq!(ticket.request.page, 1);
        assert_eq!(ticket.request.page_size, 25);

        view.set_page(3).unwrap();
        assert_eq!(view.toggle_sort("status").unwrap().request.page, 1);

        view.set_page(3).unwrap();
        assert_eq!(view.clear_filters().unwrap().request.page, 1);
    }

    #[test]
    fn test_toggle_sort_flips_direction() {
        let mut view = controller();
        view.toggle_sort("age").unwrap();
        let ticket = view.toggle_sort("age").unwrap();
        assert_eq!(ticket.request.sort, Some(SortSpec::desc("age")));

        let ticket = view.toggle_sort("name").unwrap();
        assert_eq!(ticket.request.sort, Some(SortSpec::asc("name")));
    }

    #[test]
    fn test_superseded_result_is_dropped() {
        let mut view = controller();
        let log = ChangeLog::new();
        let a = view.set_page(2).unwrap();
        let b = view.set_page_size(5).unwrap();

        assert!(matches!(view.resolve(&b, Ok(page(&["b1"], "new")), &log), LoadOutcome::Applied { rows: 1 }));
        assert!(matches!(view.resolve(&a, Ok(page(&["a1", "a2"], "old")), &log), LoadOutcome::Superseded { .. }));
        assert_eq!(view.rows()[0].id, RowId::new("b1"));
        assert_eq!(view.state(), &ViewState::Loaded);
    }

    #[test]
    fn test_failure_keeps_stale_rows() {
        let mut view = controller();
        let log = ChangeLog::new();
        let first = view.refresh().unwrap();
        view.resolve(&first, Ok(page(&["r1"], "x")), &log);

        let second = view.set_page(2).unwrap();
        let outcome = view.resolve(&second, Err(GridError::FetchFailed("offline".into())), &log);

        assert!(matches!(outcome, LoadOutcome::Failed(GridError::FetchFailed(_))));
        assert!(view.state().is_error());
        assert_eq!(view.rows().len(), 1);
    }

    #[test]
    fn test_resolve_overlays_pending_edits() {
        let mut view = controller();
        let mut log = ChangeLog::new();
        log.record_edit(&RowId::new("r1"), "status", &"pending".into(), "active".into());

        let ticket = view.refresh().unwrap();
        view.resolve(&ticket, Ok(page(&["r1", "r2"], "pending")), &log);

        assert_eq!(view.displayed_value(&RowId::new("r1"), "status"), Some(&Value::from("active")));
        assert_eq!(view.server_row(&RowId::new("r1")).unwrap().get("status"), &Value::from("pending"));
        assert_eq!(view.displayed_value(&RowId::new("r2"), "status"), Some(&Value::from("pending")));
    }

    #[test]
    fn test_invalid_page_rejected_without_state_change() {
        let mut view = controller();
        assert!(view.set_page(0).is_err());
        assert_eq!(view.state(), &ViewState::Idle);
        assert_eq!(view.generation(), 0);
    }
}

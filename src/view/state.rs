use crate::core::DatasetId;
use crate::store::PageRequest;

/// Load state of the visible page.
///
/// ```text
/// Idle ──issue──> Loading ──ok──> Loaded
///                    │  ▲           │
///                    │  └──issue────┘
///                    └──err──> Error (previous rows stay visible)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(String),
}

impl ViewState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Handle for one issued page fetch. Only the ticket carrying the latest
/// generation may change what the grid shows.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub generation: u64,
    pub request: PageRequest,
}

impl FetchTicket {
    pub fn dataset_id(&self) -> &DatasetId {
        &self.request.dataset_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The page is now visible, with pending edits overlaid.
    Applied { rows: usize },
    /// The fetch for the current parameters failed; stale rows remain.
    Failed(crate::core::GridError),
    /// A newer request was issued; this result was dropped.
    Superseded { generation: u64 },
}

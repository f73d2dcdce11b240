// ============================================================================
// gridstage
// ============================================================================
//
// Change tracking and reconciliation behind a paginated data-grid editor:
// per-cell edits with last-write-wins, reconciliation of pending edits onto
// freshly fetched pages, and two-phase stage/commit persistence.
//
// ============================================================================

//! # Example
//!
//! Open a session over an in-memory dataset, edit a cell, stage and commit.
//!
//! ```
//! use gridstage::{
//!     Column, DataType, DatasetId, DatasetMeta, EditorSession, InMemoryRowStore, Row, RowId,
//!     SessionConfig, StageOutcome,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryRowStore::new());
//! let id = DatasetId::new("orders");
//! let meta = DatasetMeta::new(id.clone(), "orders", vec![Column::new("status", DataType::String)]);
//! store
//!     .create_dataset(meta, vec![Row::new("r1").with("status", "pending")])
//!     .await?;
//!
//! let mut session = EditorSession::open(store, id, SessionConfig::default()).await?;
//! session.edit_cell(&RowId::new("r1"), "status", "active".into())?;
//! assert_eq!(session.changes().len(), 1);
//!
//! let outcome = session.stage().await?;
//! assert!(matches!(outcome, StageOutcome::Staged(_)));
//! assert!(session.can_commit());
//! session.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod change;
pub mod config;
pub mod core;
pub mod prefs;
pub mod session;
pub mod staging;
pub mod store;
pub mod validation;
pub mod view;

// Re-export main types for convenience
pub use change::{Change, ChangeLog, EditOutcome, EditTracker, ModifiedRowIndex};
pub use config::SessionConfig;
pub use crate::core::{
    Column, ColumnStats, DataType, DatasetId, DatasetMeta, GridError, Result, Row, RowId, Severity,
    ValidationRules, Value,
};
pub use prefs::{MemoryPreferences, PreferenceStore, ViewPreferences};
pub use session::{BulkTarget, EditorSession, StageOutcome};
pub use staging::{CommitReceipt, StageReceipt, StagingProtocol};
pub use store::{InMemoryRowStore, Page, PageRequest, RowStore, StagedInfo, StoreOp};
pub use validation::{RuleKind, ValidationEngine, ValidationIssue, ValidationReport};
pub use view::{
    FetchTicket, Filter, FilterOp, LoadOutcome, SortDirection, SortSpec, ViewController, ViewParams,
    ViewState,
};

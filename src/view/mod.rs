//! Paginated, sorted, filtered view over a dataset.

mod controller;
mod filter;
mod params;
mod sort;
mod state;

pub use controller::ViewController;
pub use filter::matches_all;
pub use params::{Filter, FilterOp, SortDirection, SortSpec, ViewParams};
pub use sort::{NullOrdering, compare_values, sort_rows};
pub use state::{FetchTicket, LoadOutcome, ViewState};

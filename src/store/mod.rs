//! Client-side list state: filters, pagination, sort and selection.
//!
//! Nothing here performs I/O; the flows drive fetching and feed results back.

pub mod list_store;
pub mod selection;
pub mod sort;

pub use list_store::{FilterKey, ListStore, PaginationPatch};
pub use selection::{CappedSelection, SelectAllOutcome, SelectionChange, MASS_DOWNLOAD_CAP};
pub use sort::{SortConfig, SortOrder, DEFAULT_SORT_FIELD};

//! Page-level controllers composed from the services and stores.

pub mod customer_dashboard;
pub mod debounce;
pub mod mass_download;
pub mod photo_manager;
pub mod photo_viewer;
pub mod shipment_list;

pub use customer_dashboard::CustomerDashboard;
pub use debounce::{DebouncedSearch, Debouncer};
pub use mass_download::{DownloadReport, DownloadTarget, MassDownloader};
pub use photo_manager::{PhotoManager, SaveSummary, StagedPhoto};
pub use photo_viewer::{PhotoViewer, ViewerKey};
pub use shipment_list::{FetchTicket, ShipmentList};

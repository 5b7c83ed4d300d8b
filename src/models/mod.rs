pub mod date;
pub mod pagination;
pub mod photo;
pub mod shipment;
pub mod stats;
pub mod user;
pub mod vessel;

pub use date::{parse_date, storage_days, validate_date_range, StorageBand};
pub use pagination::{Ack, DataEnvelope, ListEnvelope, Page, Pagination, RawPagination};
pub use photo::*;
pub use shipment::*;
pub use stats::*;
pub use user::*;
pub use vessel::*;

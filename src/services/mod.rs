pub mod auth_service;
pub mod customer_service;
pub mod photo_service;
pub mod shipment_service;
pub mod stats_service;
pub mod user_service;
pub mod vessel_service;

pub use auth_service::AuthService;
pub use customer_service::CustomerShipmentService;
pub use photo_service::PhotoService;
pub use shipment_service::ShipmentService;
pub use stats_service::StatsService;
pub use user_service::UserService;
pub use vessel_service::VesselService;

use crate::store::SortConfig;

/// Query sent to every paginated list endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Non-empty filter values in wire names.
    pub filters: Vec<(String, String)>,
    pub page: u32,
    pub limit: u32,
    pub sort: Option<SortConfig>,
}

impl ListQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            filters: Vec::new(),
            page: page.max(1),
            limit: limit.max(1),
            sort: None,
        }
    }

    pub fn with_filter(mut self, key: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.filters.push((key.to_string(), value));
        }
        self
    }

    pub fn with_sort(mut self, sort: SortConfig) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Filters first, then `page`, `limit`, `sortBy`, `sortOrder`.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("limit".to_string(), self.limit.to_string()));
        if let Some(sort) = &self.sort {
            pairs.push(("sortBy".to_string(), sort.field.clone()));
            pairs.push(("sortOrder".to_string(), sort.order.as_str().to_string()));
        }
        pairs
    }
}

pub(crate) fn require_ids(ids: &[String], action: &str) -> crate::error::AppResult<()> {
    if ids.is_empty() {
        return Err(crate::error::AppError::Validation(format!(
            "Select at least one shipment to {}",
            action
        )));
    }
    Ok(())
}

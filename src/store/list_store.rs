use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::Pagination;
use crate::services::ListQuery;

use super::sort::SortConfig;

/// Filter fields shared by the shipment, vessel and user lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    Search,
    ChassisNumber,
    ClientId,
    VesselId,
    Yard,
    ExportStatus,
    DateType,
    DateFrom,
    DateTo,
    JobNumber,
    Pod,
}

impl FilterKey {
    pub const ALL: [FilterKey; 11] = [
        FilterKey::Search,
        FilterKey::ChassisNumber,
        FilterKey::ClientId,
        FilterKey::VesselId,
        FilterKey::Yard,
        FilterKey::ExportStatus,
        FilterKey::DateType,
        FilterKey::DateFrom,
        FilterKey::DateTo,
        FilterKey::JobNumber,
        FilterKey::Pod,
    ];

    /// Query-string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Search => "search",
            FilterKey::ChassisNumber => "chassisNumber",
            FilterKey::ClientId => "clientId",
            FilterKey::VesselId => "vesselId",
            FilterKey::Yard => "yard",
            FilterKey::ExportStatus => "exportStatus",
            FilterKey::DateType => "dateType",
            FilterKey::DateFrom => "dateFrom",
            FilterKey::DateTo => "dateTo",
            FilterKey::JobNumber => "jobNumber",
            FilterKey::Pod => "pod",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("Unknown filter: {}", s)))
    }
}

/// Partial pagination update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationPatch {
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub total_items: Option<u64>,
    pub page_size: Option<u32>,
    pub has_next: Option<bool>,
    pub has_prev: Option<bool>,
}

impl From<Pagination> for PaginationPatch {
    fn from(p: Pagination) -> Self {
        Self {
            current_page: Some(p.current_page),
            total_pages: Some(p.total_pages),
            total_items: Some(p.total_items),
            page_size: Some(p.page_size),
            has_next: Some(p.has_next),
            has_prev: Some(p.has_prev),
        }
    }
}

/// Filter, pagination, sort and row-selection state for one list page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListStore {
    filters: BTreeMap<FilterKey, String>,
    pagination: Pagination,
    sort: SortConfig,
    selected: Vec<String>,
}

impl Default for ListStore {
    fn default() -> Self {
        Self::new(Pagination::default().page_size)
    }
}

impl ListStore {
    pub fn new(page_size: u32) -> Self {
        Self {
            filters: BTreeMap::new(),
            pagination: Pagination::first(page_size),
            sort: SortConfig::default(),
            selected: Vec::new(),
        }
    }

    pub fn filter(&self, key: FilterKey) -> Option<&str> {
        self.filters.get(&key).map(String::as_str)
    }

    pub fn filters(&self) -> impl Iterator<Item = (FilterKey, &str)> {
        self.filters.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn sort(&self) -> &SortConfig {
        &self.sort
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    /// An empty value removes the filter. Any change returns to page one.
    pub fn set_filter(&mut self, key: FilterKey, value: impl Into<String>) {
        let value = value.into();
        let changed = if value.trim().is_empty() {
            self.filters.remove(&key).is_some()
        } else {
            self.filters.insert(key, value.clone()) != Some(value)
        };
        if changed {
            self.pagination.current_page = 1;
        }
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.selected.clear();
        self.pagination.current_page = 1;
    }

    pub fn has_filters_applied(&self) -> bool {
        self.filters.values().any(|v| !v.trim().is_empty())
    }

    pub fn set_pagination(&mut self, patch: PaginationPatch) {
        let p = &mut self.pagination;
        if let Some(v) = patch.current_page {
            p.current_page = v.max(1);
        }
        if let Some(v) = patch.total_pages {
            p.total_pages = v.max(1);
        }
        if let Some(v) = patch.total_items {
            p.total_items = v;
        }
        if let Some(v) = patch.page_size {
            p.page_size = v.max(1);
        }
        if let Some(v) = patch.has_next {
            p.has_next = v;
        }
        if let Some(v) = patch.has_prev {
            p.has_prev = v;
        }
    }

    pub fn set_current_page(&mut self, page: u32) {
        self.pagination.current_page = page.max(1);
    }

    pub fn set_page_size(&mut self, size: u32) {
        self.pagination.page_size = size.max(1);
        self.pagination.current_page = 1;
    }

    pub fn set_sort_config(&mut self, sort: SortConfig) {
        self.sort = sort;
    }

    pub fn toggle_row_selection(&mut self, id: &str) {
        match self.selected.iter().position(|s| s == id) {
            Some(pos) => {
                self.selected.remove(pos);
            }
            None => self.selected.push(id.to_string()),
        }
    }

    /// Selects every id unless all are already selected, in which case clears.
    pub fn toggle_all_selection(&mut self, all_ids: &[String]) {
        let all_selected = !all_ids.is_empty() && all_ids.iter().all(|id| self.is_selected(id));
        if all_selected {
            self.selected.clear();
        } else {
            self.selected = all_ids.to_vec();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Request for the current state.
    pub fn to_query(&self) -> ListQuery {
        let mut query = ListQuery::new(self.pagination.current_page, self.pagination.page_size)
            .with_sort(self.sort.clone());
        for (key, value) in &self.filters {
            query = query.with_filter(key.as_str(), value.clone());
        }
        query
    }
}

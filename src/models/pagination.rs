//! Canonical pagination contract.
//!
//! Admin endpoints answer with `meta.pagination.{hasNextPage,hasPrevPage}`,
//! customer and vessel endpoints with `pagination.{hasNext,hasPrev}`. Both are
//! decoded into [`RawPagination`] and normalised into [`Pagination`] here, so no
//! caller ever sees the wire shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    pub page_size: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn first(page_size: u32) -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_items: 0,
            page_size: page_size.max(1),
            has_next: false,
            has_prev: false,
        }
    }

    /// Recomputes page count and navigation flags after `total_items` changed,
    /// clamping the current page into range.
    pub fn recompute(&mut self, total_items: u64) {
        self.total_items = total_items;
        self.total_pages = pages_for(total_items, self.page_size);
        self.current_page = self.current_page.clamp(1, self.total_pages);
        self.has_next = self.current_page < self.total_pages;
        self.has_prev = self.current_page > 1;
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first(10)
    }
}

fn pages_for(total_items: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total_items.div_ceil(size);
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}

/// Union of both backend pagination shapes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPagination {
    #[serde(default, alias = "page")]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default, alias = "total")]
    pub total_items: Option<u64>,
    #[serde(default, alias = "limit")]
    pub page_size: Option<u32>,
    #[serde(default, alias = "hasNextPage")]
    pub has_next: Option<bool>,
    #[serde(default, alias = "hasPrevPage")]
    pub has_prev: Option<bool>,
}

impl RawPagination {
    /// Missing fields fall back to what was requested.
    pub fn normalize(&self, requested_page: u32, requested_size: u32) -> Pagination {
        let page_size = self.page_size.unwrap_or(requested_size).max(1);
        let total_items = self.total_items.unwrap_or(0);
        let total_pages = self
            .total_pages
            .unwrap_or_else(|| pages_for(total_items, page_size))
            .max(1);
        let current_page = self.current_page.unwrap_or(requested_page).max(1);

        Pagination {
            current_page,
            total_pages,
            total_items,
            page_size,
            has_next: self.has_next.unwrap_or(current_page < total_pages),
            has_prev: self.has_prev.unwrap_or(current_page > 1),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub pagination: Option<RawPagination>,
}

/// `{success, data, meta:{pagination}}` or `{success, data, pagination}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default)]
    pub pagination: Option<RawPagination>,
}

impl<T> ListEnvelope<T> {
    pub fn into_page(self, requested_page: u32, requested_size: u32) -> Page<T> {
        let raw = self
            .meta
            .and_then(|m| m.pagination)
            .or(self.pagination)
            .unwrap_or_default();
        let mut pagination = raw.normalize(requested_page, requested_size);
        if raw.total_items.is_none() && raw.total_pages.is_none() {
            pagination.recompute(self.data.len() as u64);
        }
        Page {
            items: self.data,
            pagination,
        }
    }
}

/// `{success, data, message}` with a single payload.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
}

/// Acknowledgement bodies whose payload carries nothing the client needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admin_shape_normalizes() {
        let env: ListEnvelope<u32> = serde_json::from_value(json!({
            "success": true,
            "data": [1, 2, 3],
            "meta": {"pagination": {
                "currentPage": 2, "totalPages": 4, "totalItems": 38,
                "hasNextPage": true, "hasPrevPage": true
            }}
        }))
        .unwrap();
        let page = env.into_page(2, 10);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(
            page.pagination,
            Pagination {
                current_page: 2,
                total_pages: 4,
                total_items: 38,
                page_size: 10,
                has_next: true,
                has_prev: true,
            }
        );
    }

    #[test]
    fn test_customer_shape_normalizes() {
        let env: ListEnvelope<u32> = serde_json::from_value(json!({
            "success": true,
            "data": [],
            "pagination": {
                "currentPage": 1, "totalPages": 3, "totalItems": 25,
                "pageSize": 10, "hasNext": true, "hasPrev": false
            }
        }))
        .unwrap();
        let page = env.into_page(1, 20);
        assert_eq!(page.pagination.page_size, 10);
        assert!(page.pagination.has_next);
        assert!(!page.pagination.has_prev);
        assert_eq!(page.pagination.total_items, 25);
    }

    #[test]
    fn test_missing_pagination_falls_back_to_request() {
        let env: ListEnvelope<u32> =
            serde_json::from_value(json!({"success": true, "data": [1, 2]})).unwrap();
        let page = env.into_page(1, 10);
        assert_eq!(page.pagination.total_items, 2);
        assert_eq!(page.pagination.total_pages, 1);
        assert!(!page.pagination.has_next);
    }

    #[test]
    fn test_recompute_clamps_current_page() {
        let mut p = Pagination {
            current_page: 3,
            total_pages: 3,
            total_items: 21,
            page_size: 10,
            has_next: false,
            has_prev: true,
        };
        p.recompute(20);
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.current_page, 2);
        assert!(!p.has_next);

        p.recompute(0);
        assert_eq!(p.total_pages, 1);
        assert_eq!(p.current_page, 1);
        assert!(!p.has_prev);
    }
}

// ABOUTME: Pagination for request listings
// ABOUTME: 1-based page parameters clamped for SQL and a page-plus-total response wrapper

use serde::{Deserialize, Serialize};

/// Default page size when the caller gives none
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on page size
pub const MAX_PAGE_SIZE: i64 = 100;

pub const MIN_PAGE: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_limit", alias = "pageSize")]
    pub limit: i64,
}

fn default_page() -> i64 {
    MIN_PAGE
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    pub fn new() -> Self {
        Self::with_page_and_limit(MIN_PAGE, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_and_limit(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// First page using the configured default page size
    pub fn first_page(default_page_size: i64) -> Self {
        Self::with_page_and_limit(MIN_PAGE, default_page_size)
    }

    pub fn page(&self) -> i64 {
        self.page.max(MIN_PAGE)
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Zero-based row offset for SQL
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(params: &PaginationParams, total_items: i64) -> Self {
        let page = params.page();
        let page_size = params.limit();
        let total_pages = (total_items.max(0) + page_size - 1) / page_size;

        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > MIN_PAGE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: &PaginationParams, total_items: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(params, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = PaginationParams::with_page_and_limit(0, 500);
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);

        let params = PaginationParams::with_page_and_limit(-3, -5);
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PaginationParams::with_page_and_limit(3, 10).offset(), 20);
        assert_eq!(PaginationParams::first_page(15).limit(), 15);
    }

    #[test]
    fn test_meta_for_partial_last_page() {
        let params = PaginationParams::with_page_and_limit(3, 20);
        let meta = PaginationMeta::new(&params, 45);

        assert_eq!(meta.total_pages, 3);
        assert!(!meta.has_next_page);
        assert!(meta.has_previous_page);
    }

    #[test]
    fn test_meta_for_empty_result() {
        let meta = PaginationMeta::new(&PaginationParams::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next_page);
        assert!(!meta.has_previous_page);
    }

    #[test]
    fn test_deserialize_accepts_page_size_alias() {
        let params: PaginationParams = serde_json::from_str(r#"{"page":2,"pageSize":5}"#).unwrap();
        assert_eq!(params.page(), 2);
        assert_eq!(params.limit(), 5);

        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, PaginationParams::default());
    }
}

//! Shared pagination utilities
//!
//! Common pagination types used by the listing queries. Defaults: page 1,
//! 100 items per page, capped at 1000.

use serde::{Deserialize, Serialize};

/// Pagination request parameters
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PageParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Items per page. Defaults to 100, clamped to 1-1000.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page, limit }
    }

    /// Page number (1-indexed), defaulting to 1
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Items per page, defaulting to 100 and clamped to 1-1000
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 1000)
    }

    /// Offset of the first item of the current page
    pub fn offset(&self) -> usize {
        ((self.page() - 1) * self.limit()) as usize
    }
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PageMeta {
    /// Create pagination metadata from page parameters and total count
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total as f64) / (limit as f64)).ceil() as i64
        };

        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }

    pub fn from_params(params: &PageParams, total: i64) -> Self {
        Self::new(params.page(), params.limit(), total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_page_params_clamping() {
        let params = PageParams::new(Some(-2), Some(5000));
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 1000);
    }

    #[test]
    fn test_page_params_offset() {
        let params = PageParams::new(Some(3), Some(50));
        assert_eq!(params.offset(), 100);
    }

    #[test]
    fn test_page_meta() {
        let meta = PageMeta::new(2, 100, 250);
        assert_eq!(meta.total_pages, 3);
    }

    #[test]
    fn test_page_meta_empty() {
        let meta = PageMeta::new(1, 100, 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn test_page_meta_serializes_camel_case() {
        let meta = PageMeta::new(1, 100, 7);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["totalPages"], 1);
    }
}

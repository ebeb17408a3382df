//! Listing query handlers

pub mod live_listing;
pub mod snapshot_listing;

use super::stats::ListingStats;
use crate::features::shared::{PageMeta, PageParams};
use crate::snapshot::OccurrenceRecord;
use serde::{Deserialize, Serialize};

/// Query parameters of the listing endpoint
///
/// Presence of any live-only filter (basis of record, coordinate-uncertainty
/// ceiling, named data source) switches the request to live mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(rename = "minCount")]
    pub min_count: Option<u64>,
    #[serde(rename = "maxCount")]
    pub max_count: Option<u64>,
    /// `asc` or `desc` (default `desc`)
    pub sort: Option<String>,
    /// Red List category code; `NE` selects unevaluated species
    pub category: Option<String>,
    /// Free-text match against scientific and common names
    pub search: Option<String>,
    #[serde(rename = "basisOfRecord")]
    pub basis_of_record: Option<String>,
    #[serde(rename = "maxUncertainty")]
    pub max_uncertainty: Option<u32>,
    #[serde(rename = "datasetKey")]
    pub dataset_key: Option<String>,
}

impl ListingQuery {
    /// Whether any live-only filter is present
    pub fn is_live(&self) -> bool {
        self.basis_of_record.is_some()
            || self.max_uncertainty.is_some()
            || self.dataset_key.is_some()
    }

    pub fn page_params(&self) -> PageParams {
        PageParams::new(self.page, self.limit)
    }

    pub fn sort_order(&self) -> Result<SortOrder, String> {
        match self.sort.as_deref() {
            None | Some("desc") => Ok(SortOrder::Descending),
            Some("asc") => Ok(SortOrder::Ascending),
            Some(other) => Err(other.to_string()),
        }
    }

    /// Whether a count passes the min/max range filter
    pub fn count_in_range(&self, count: u64) -> bool {
        count >= self.min_count.unwrap_or(0) && count <= self.max_count.unwrap_or(u64::MAX)
    }

    /// Whether a derived category passes the category filter
    ///
    /// The synthetic `NE` bucket selects rows with no matched category.
    pub fn category_matches(&self, category: Option<&str>) -> bool {
        match self.category.as_deref() {
            None => true,
            Some(filter) if filter.eq_ignore_ascii_case("NE") => category.is_none(),
            Some(filter) => category.is_some_and(|c| c.eq_ignore_ascii_case(filter)),
        }
    }

    /// Whether a row passes the free-text search filter
    pub fn search_matches(&self, record: &OccurrenceRecord) -> bool {
        let Some(ref term) = self.search else {
            return true;
        };
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let hit = |name: &Option<String>| {
            name.as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&term))
        };
        hit(&record.scientific_name) || hit(&record.common_name)
    }
}

/// Sort order over occurrence counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Listing endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub data: Vec<OccurrenceRecord>,
    pub pagination: PageMeta,
    pub stats: ListingStats,
    #[serde(rename = "isLiveQuery", skip_serializing_if = "Option::is_none")]
    pub is_live_query: Option<bool>,
    #[serde(rename = "dataAvailable")]
    pub data_available: bool,
}

impl ListingResponse {
    /// Well-formed empty page for a taxon with no loadable data
    pub fn unavailable(params: &PageParams) -> Self {
        Self {
            data: Vec::new(),
            pagination: PageMeta::from_params(params, 0),
            stats: ListingStats::empty(),
            is_live_query: None,
            data_available: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_mode_selection() {
        let mut query = ListingQuery::default();
        assert!(!query.is_live());
        query.basis_of_record = Some("PRESERVED_SPECIMEN".to_string());
        assert!(query.is_live());

        let query = ListingQuery {
            max_uncertainty: Some(1000),
            ..ListingQuery::default()
        };
        assert!(query.is_live());
    }

    #[test]
    fn test_category_filter_ne_selects_unevaluated() {
        let query = ListingQuery {
            category: Some("NE".to_string()),
            ..ListingQuery::default()
        };
        assert!(query.category_matches(None));
        assert!(!query.category_matches(Some("EN")));
    }

    #[test]
    fn test_category_filter_is_case_insensitive() {
        let query = ListingQuery {
            category: Some("en".to_string()),
            ..ListingQuery::default()
        };
        assert!(query.category_matches(Some("EN")));
        assert!(!query.category_matches(None));
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(
            ListingQuery::default().sort_order(),
            Ok(SortOrder::Descending)
        );
        let query = ListingQuery {
            sort: Some("asc".to_string()),
            ..ListingQuery::default()
        };
        assert_eq!(query.sort_order(), Ok(SortOrder::Ascending));
        let query = ListingQuery {
            sort: Some("sideways".to_string()),
            ..ListingQuery::default()
        };
        assert!(query.sort_order().is_err());
    }

    #[test]
    fn test_count_range() {
        let query = ListingQuery {
            min_count: Some(1),
            max_count: Some(1),
            ..ListingQuery::default()
        };
        assert!(query.count_in_range(1));
        assert!(!query.count_in_range(0));
        assert!(!query.count_in_range(2));
    }
}

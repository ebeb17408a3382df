//! Precomputed-mode listing query
//!
//! Serves the listing from the snapshot occurrence table. Statistics are
//! computed over the unfiltered taxon set; filters narrow the page only. A
//! missing or unloadable snapshot degrades to an empty page with the
//! data-available signal cleared, never to a failure.

use super::{ListingQuery, ListingResponse, SortOrder};
use crate::error::AppError;
use crate::features::shared::PageMeta;
use crate::features::FeatureState;
use crate::features::listings::stats;
use crate::snapshot::OccurrenceRecord;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotListingError {
    #[error("Unknown taxon: {0}")]
    UnknownTaxon(String),
    #[error("Invalid sort order: {0} (expected 'asc' or 'desc')")]
    InvalidSort(String),
}

impl From<SnapshotListingError> for AppError {
    fn from(err: SnapshotListingError) -> Self {
        match err {
            SnapshotListingError::UnknownTaxon(_) => AppError::NotFound(err.to_string()),
            SnapshotListingError::InvalidSort(_) => AppError::Validation(err.to_string()),
        }
    }
}

#[tracing::instrument(skip(state, query), fields(taxon = %taxon_id))]
pub async fn handle(
    state: &FeatureState,
    taxon_id: &str,
    query: ListingQuery,
) -> Result<ListingResponse, SnapshotListingError> {
    let taxon = state
        .registry
        .resolve(taxon_id)
        .ok_or_else(|| SnapshotListingError::UnknownTaxon(taxon_id.to_string()))?;
    let sort = query
        .sort_order()
        .map_err(SnapshotListingError::InvalidSort)?;
    let params = query.page_params();

    let Some(snapshot) = state.snapshots.get(taxon) else {
        tracing::warn!(taxon = %taxon_id, "snapshot unavailable, serving empty listing");
        return Ok(ListingResponse::unavailable(&params));
    };

    let mut filtered: Vec<OccurrenceRecord> = snapshot
        .occurrences
        .iter()
        .filter(|r| query.count_in_range(r.occurrence_count))
        .filter(|r| query.category_matches(r.redlist_category.as_deref()))
        .filter(|r| query.search_matches(r))
        .cloned()
        .collect();

    // The table is pre-sorted descending; only ascending needs a re-sort.
    if sort == SortOrder::Ascending {
        filtered.sort_by_key(|r| r.occurrence_count);
    }

    let total_filtered = filtered.len();
    let page: Vec<OccurrenceRecord> = filtered
        .into_iter()
        .skip(params.offset())
        .take(params.limit() as usize)
        .collect();

    let stats = stats::from_records(&snapshot.occurrences, total_filtered as u64);

    Ok(ListingResponse {
        data: page,
        pagination: PageMeta::from_params(&params, total_filtered as i64),
        stats,
        is_live_query: None,
        data_available: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::providers::Providers;
    use crate::registry::{TaxonConfig, TaxonRegistry};
    use crate::snapshot::SnapshotStore;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    fn write_fixture(dir: &std::path::Path) {
        let snapshot = serde_json::json!({
            "metadata": {
                "total": 3,
                "fetched_at": "2025-06-01T00:00:00Z",
                "categories": {"EN": 1, "LC": 2}
            },
            "species": [
                {"sis_id": 1, "scientific_name": "Quercus robur", "category": "LC"},
                {"sis_id": 2, "scientific_name": "Quercus ilex", "category": "EN"},
                {"sis_id": 3, "scientific_name": "Quercus suber", "category": "LC"}
            ]
        });
        std::fs::write(
            dir.join("plantae.json"),
            serde_json::to_string(&snapshot).unwrap(),
        )
        .unwrap();

        let mut table = std::fs::File::create(dir.join("plantae_occurrences.csv")).unwrap();
        writeln!(table, "speciesKey,count,scientificName").unwrap();
        writeln!(table, "101,500,Quercus robur").unwrap();
        writeln!(table, "102,1,Quercus ilex").unwrap();
        writeln!(table, "103,1,Unlisted species").unwrap();
    }

    fn state_with_fixture(dir: &std::path::Path) -> FeatureState {
        write_fixture(dir);
        let registry = TaxonRegistry::from_taxa(vec![TaxonConfig {
            id: "plantae".to_string(),
            name: "Plants".to_string(),
            snapshot_files: vec!["plantae.json".to_string()],
            occurrence_files: vec!["plantae_occurrences.csv".to_string()],
            classification_keys: vec![6],
        }]);
        FeatureState {
            registry: Arc::new(registry),
            snapshots: Arc::new(SnapshotStore::new(dir, Duration::from_secs(3600))),
            providers: Arc::new(
                Providers::new(&crate::config::Config::default().providers).unwrap(),
            ),
            cache: Arc::new(MemoryCache::new()),
        }
    }

    #[tokio::test]
    async fn test_exact_count_range_returns_only_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_fixture(dir.path());

        let query = ListingQuery {
            min_count: Some(1),
            max_count: Some(1),
            ..ListingQuery::default()
        };
        let response = handle(&state, "plantae", query).await.unwrap();

        assert_eq!(response.data.len(), 2);
        assert!(response.data.iter().all(|r| r.occurrence_count == 1));
        // stats stay scoped to the unfiltered set
        assert_eq!(response.stats.total, 3);
        assert_eq!(response.stats.filtered, 2);
    }

    #[tokio::test]
    async fn test_category_filter_ne() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_fixture(dir.path());

        let query = ListingQuery {
            category: Some("NE".to_string()),
            ..ListingQuery::default()
        };
        let response = handle(&state, "plantae", query).await.unwrap();

        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].species_key, 103);
        assert!(response.data[0].redlist_category.is_none());
    }

    #[tokio::test]
    async fn test_ascending_sort() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_fixture(dir.path());

        let query = ListingQuery {
            sort: Some("asc".to_string()),
            ..ListingQuery::default()
        };
        let response = handle(&state, "plantae", query).await.unwrap();

        let counts: Vec<u64> = response.data.iter().map(|r| r.occurrence_count).collect();
        assert_eq!(counts, vec![1, 1, 500]);
    }

    #[tokio::test]
    async fn test_unknown_taxon_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_with_fixture(dir.path());

        let result = handle(&state, "fungi", ListingQuery::default()).await;
        assert!(matches!(
            result,
            Err(SnapshotListingError::UnknownTaxon(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_files_degrade_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TaxonRegistry::from_taxa(vec![TaxonConfig {
            id: "aves".to_string(),
            name: "Birds".to_string(),
            snapshot_files: vec!["missing.json".to_string()],
            occurrence_files: vec![],
            classification_keys: vec![],
        }]);
        let state = FeatureState {
            registry: Arc::new(registry),
            snapshots: Arc::new(SnapshotStore::new(dir.path(), Duration::from_secs(3600))),
            providers: Arc::new(
                Providers::new(&crate::config::Config::default().providers).unwrap(),
            ),
            cache: Arc::new(MemoryCache::new()),
        };

        let response = handle(&state, "aves", ListingQuery::default()).await.unwrap();
        assert!(!response.data_available);
        assert!(response.data.is_empty());
        assert_eq!(response.pagination.total, 0);
    }
}

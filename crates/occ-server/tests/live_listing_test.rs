//! Integration tests for the live-mode listing
//!
//! The faceted provider query is mocked with wiremock; the snapshot fixture
//! on disk supplies the validation key set.

use occ_server::cache::MemoryCache;
use occ_server::config::ProviderConfig;
use occ_server::features::listings::queries::{live_listing, ListingQuery};
use occ_server::features::listings::queries::live_listing::LiveListingError;
use occ_server::features::FeatureState;
use occ_server::providers::Providers;
use occ_server::registry::{TaxonConfig, TaxonRegistry};
use occ_server::snapshot::SnapshotStore;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_fixture(dir: &std::path::Path) {
    let snapshot = json!({
        "metadata": {
            "total": 2,
            "fetched_at": "2025-06-01T00:00:00Z",
            "categories": {"LC": 2}
        },
        "species": [
            {"sis_id": 1, "scientific_name": "Quercus robur", "category": "LC"},
            {"sis_id": 2, "scientific_name": "Quercus ilex", "category": "LC"}
        ]
    });
    std::fs::write(
        dir.join("plantae.json"),
        serde_json::to_string(&snapshot).unwrap(),
    )
    .unwrap();

    let mut table = std::fs::File::create(dir.join("plantae_occurrences.csv")).unwrap();
    writeln!(table, "speciesKey,count,scientificName").unwrap();
    writeln!(table, "101,400,Quercus robur").unwrap();
    writeln!(table, "102,9,Quercus ilex").unwrap();
}

fn state_for(server: &MockServer, dir: &std::path::Path) -> FeatureState {
    write_fixture(dir);
    let config = ProviderConfig {
        gbif_url: server.uri(),
        inat_url: server.uri(),
        redlist_url: server.uri(),
        redlist_token: Some("test-token".to_string()),
        literature_url: server.uri(),
        request_timeout_secs: 5,
    };
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
        providers: Arc::new(Providers::new(&config).unwrap()),
        cache: Arc::new(MemoryCache::new()),
    }
}

async fn mount_facets(server: &MockServer, expect: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/occurrence/search"))
        .and(query_param("facet", "speciesKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 0,
            "facets": [{
                "field": "SPECIES_KEY",
                "counts": [
                    {"name": "101", "count": 40},
                    {"name": "102", "count": 10},
                    {"name": "999", "count": 77}
                ]
            }]
        })));
    match expect {
        Some(n) => mock.expect(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

#[tokio::test]
async fn facets_outside_the_snapshot_are_excluded_everywhere() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_facets(&server, None).await;

    Mock::given(method("GET"))
        .and(path("/species/101"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"canonicalName": "Quercus robur"})),
        )
        .mount(&server)
        .await;
    // Name resolution for 102 fails; a placeholder takes its place.
    Mock::given(method("GET"))
        .and(path("/species/102"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let state = state_for(&server, dir.path());
    let query = ListingQuery {
        basis_of_record: Some("PRESERVED_SPECIMEN".to_string()),
        ..ListingQuery::default()
    };

    let response = live_listing::handle(&state, "plantae", query).await.unwrap();

    assert_eq!(response.is_live_query, Some(true));
    // Key 999 is absent from the snapshot table: not in the page, not in
    // the stats.
    assert_eq!(response.data.len(), 2);
    assert!(response.data.iter().all(|r| r.species_key != 999));
    assert_eq!(response.stats.total, 2);
    assert_eq!(response.stats.total_occurrences, 50);

    // Sorted descending by count.
    assert_eq!(response.data[0].species_key, 101);
    assert_eq!(response.data[0].occurrence_count, 40);
    assert_eq!(
        response.data[0].scientific_name.as_deref(),
        Some("Quercus robur")
    );
    assert_eq!(response.data[0].redlist_category.as_deref(), Some("LC"));

    assert_eq!(
        response.data[1].scientific_name.as_deref(),
        Some("Species 102")
    );
    assert!(response.data[1].redlist_category.is_none());
}

#[tokio::test]
async fn identical_query_within_ttl_hits_the_cache() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_facets(&server, Some(1)).await;

    Mock::given(method("GET"))
        .and(path("/species/101"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"canonicalName": "Quercus robur"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/species/102"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"canonicalName": "Quercus ilex"})),
        )
        .mount(&server)
        .await;

    let state = state_for(&server, dir.path());
    let query = ListingQuery {
        basis_of_record: Some("HUMAN_OBSERVATION".to_string()),
        ..ListingQuery::default()
    };

    let first = live_listing::handle(&state, "plantae", query.clone())
        .await
        .unwrap();
    let second = live_listing::handle(&state, "plantae", query).await.unwrap();

    assert_eq!(first.data.len(), second.data.len());
    assert_eq!(first.stats, second.stats);
}

#[tokio::test]
async fn facet_query_failure_propagates() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/occurrence/search"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let state = state_for(&server, dir.path());
    let query = ListingQuery {
        max_uncertainty: Some(1000),
        ..ListingQuery::default()
    };

    let result = live_listing::handle(&state, "plantae", query).await;
    assert!(matches!(result, Err(LiveListingError::Provider(_))));
}

#[tokio::test]
async fn count_range_filters_before_pagination() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_facets(&server, None).await;

    Mock::given(method("GET"))
        .and(path("/species/102"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"canonicalName": "Quercus ilex"})),
        )
        .mount(&server)
        .await;

    let state = state_for(&server, dir.path());
    let query = ListingQuery {
        basis_of_record: Some("MACHINE_OBSERVATION".to_string()),
        max_count: Some(20),
        ..ListingQuery::default()
    };

    let response = live_listing::handle(&state, "plantae", query).await.unwrap();

    assert_eq!(response.data.len(), 1);
    assert_eq!(response.data[0].species_key, 102);
    // Statistics cover the validated set, the count filter narrows the page.
    assert_eq!(response.stats.total, 2);
    assert_eq!(response.stats.filtered, 1);
    assert_eq!(response.pagination.total, 1);
}

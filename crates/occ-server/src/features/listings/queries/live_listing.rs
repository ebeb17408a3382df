//! Live-mode listing query
//!
//! Serves the listing from a faceted provider occurrence query. Facet
//! buckets are filtered to species keys present in the precomputed
//! snapshot's occurrence table before anything else; this excludes
//! subspecies, synonyms, and mis-ranked matches the provider may return.
//! Display names are resolved per species for the current page only, with a
//! placeholder substituted on individual failures. A provider failure has no
//! local fallback and fails the whole request.

use super::{ListingQuery, ListingResponse, SortOrder};
use crate::cache::{self, DEFAULT_CACHE_TTL};
use crate::error::AppError;
use crate::features::listings::stats;
use crate::features::shared::PageMeta;
use crate::features::FeatureState;
use crate::fanout;
use crate::providers::{BasisOfRecord, OccurrenceFilter, ProviderError};
use crate::snapshot::OccurrenceRecord;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveListingError {
    #[error("Unknown taxon: {0}")]
    UnknownTaxon(String),
    #[error("Invalid sort order: {0} (expected 'asc' or 'desc')")]
    InvalidSort(String),
    #[error("Invalid basis of record: {0}")]
    InvalidBasis(String),
    #[error("Facet query failed: {0}")]
    Provider(#[from] ProviderError),
}

impl From<LiveListingError> for AppError {
    fn from(err: LiveListingError) -> Self {
        match err {
            LiveListingError::UnknownTaxon(_) => AppError::NotFound(err.to_string()),
            LiveListingError::InvalidSort(_) | LiveListingError::InvalidBasis(_) => {
                AppError::Validation(err.to_string())
            },
            LiveListingError::Provider(_) => AppError::Provider(err.to_string()),
        }
    }
}

fn parse_basis(value: &str) -> Result<BasisOfRecord, LiveListingError> {
    match value.to_ascii_uppercase().as_str() {
        "HUMAN_OBSERVATION" => Ok(BasisOfRecord::HumanObservation),
        "PRESERVED_SPECIMEN" => Ok(BasisOfRecord::PreservedSpecimen),
        "MACHINE_OBSERVATION" => Ok(BasisOfRecord::MachineObservation),
        other => Err(LiveListingError::InvalidBasis(other.to_string())),
    }
}

#[tracing::instrument(skip(state, query), fields(taxon = %taxon_id))]
pub async fn handle(
    state: &FeatureState,
    taxon_id: &str,
    query: ListingQuery,
) -> Result<ListingResponse, LiveListingError> {
    let taxon = state
        .registry
        .resolve(taxon_id)
        .ok_or_else(|| LiveListingError::UnknownTaxon(taxon_id.to_string()))?;
    let sort = query.sort_order().map_err(LiveListingError::InvalidSort)?;
    let basis = query
        .basis_of_record
        .as_deref()
        .map(parse_basis)
        .transpose()?;
    let params = query.page_params();

    let cache_key = format!("listing:{}:{}", taxon_id, cache::fingerprint(&query));
    if let Some(cached) = cache::get_typed::<ListingResponse>(state.cache.as_ref(), &cache_key) {
        return Ok(cached);
    }

    let Some(snapshot) = state.snapshots.get(taxon) else {
        tracing::warn!(taxon = %taxon_id, "no snapshot to validate live facets against");
        return Ok(ListingResponse {
            is_live_query: Some(true),
            ..ListingResponse::unavailable(&params)
        });
    };

    // One facet query per classification key, merged by species key.
    let facet_queries = taxon.classification_keys.iter().map(|&key| {
        let filter = OccurrenceFilter {
            taxon_key: Some(key),
            basis_of_record: basis,
            dataset_key: query.dataset_key.clone(),
            year: None,
            month: None,
            max_coordinate_uncertainty: query.max_uncertainty,
        };
        let gbif = &state.providers.gbif;
        async move { gbif.species_facets(&filter).await }
    });
    let facet_results = futures::future::try_join_all(facet_queries).await?;

    let mut merged: BTreeMap<i64, u64> = BTreeMap::new();
    for bucket in facet_results.into_iter().flatten() {
        // Validation against the snapshot key set is the critical
        // correctness step of live mode.
        if snapshot.species_keys.contains(&bucket.species_key) {
            *merged.entry(bucket.species_key).or_insert(0) += bucket.count;
        }
    }

    let counts: Vec<u64> = merged.values().copied().collect();

    let mut entries: Vec<(i64, u64)> = merged
        .into_iter()
        .filter(|&(_, count)| query.count_in_range(count))
        .collect();
    match sort {
        SortOrder::Descending => entries.sort_by(|a, b| b.1.cmp(&a.1)),
        SortOrder::Ascending => entries.sort_by(|a, b| a.1.cmp(&b.1)),
    }

    let total_filtered = entries.len();
    let stats = stats::from_counts(&counts, total_filtered as u64);

    let page_entries: Vec<(i64, u64)> = entries
        .into_iter()
        .skip(params.offset())
        .take(params.limit() as usize)
        .collect();

    // Per-page name resolution; an individual failure degrades to a
    // placeholder, never fails the page.
    let names = futures::future::join_all(page_entries.iter().map(|&(key, _)| {
        let gbif = &state.providers.gbif;
        async move {
            fanout::settle("species name", gbif.species_name(key))
                .await
                .flatten()
        }
    }))
    .await;

    let mut page: Vec<OccurrenceRecord> = page_entries
        .into_iter()
        .zip(names)
        .map(|((species_key, occurrence_count), name)| {
            let redlist_category = name
                .as_deref()
                .and_then(|n| snapshot.category_for(n))
                .map(String::from);
            OccurrenceRecord {
                species_key,
                occurrence_count,
                scientific_name: Some(
                    name.unwrap_or_else(|| format!("Species {}", species_key)),
                ),
                common_name: None,
                occurrences_since_assessment: None,
                redlist_category,
            }
        })
        .collect();

    // Category filtering happens after name resolution, so in live mode it
    // only narrows within the current page.
    if query.category.is_some() {
        page.retain(|r| query.category_matches(r.redlist_category.as_deref()));
    }

    let response = ListingResponse {
        data: page,
        pagination: PageMeta::from_params(&params, total_filtered as i64),
        stats,
        is_live_query: Some(true),
        data_available: true,
    };

    cache::set_typed(state.cache.as_ref(), &cache_key, &response, DEFAULT_CACHE_TTL);
    Ok(response)
}

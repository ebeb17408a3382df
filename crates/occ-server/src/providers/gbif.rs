//! GBIF occurrence and taxon-match client
//!
//! Covers the taxon-match and occurrence-search provider contracts: name
//! matching with a confidence classification, occurrence counts over a
//! filter set, species facet counts for live listings, and per-species name
//! resolution.

use super::{ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};

/// Facet page size for live listing queries; large enough to cover a full
/// taxonomic group in one response
pub const FACET_LIMIT: u32 = 100_000;

/// Confidence classification for a free-text name match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    Exact,
    Fuzzy,
    Variant,
    /// Matched only to a broader rank, e.g. the genus
    Higherrank,
    None,
}

impl MatchType {
    /// Whether the match is confident enough to attribute occurrence
    /// statistics to the species itself
    ///
    /// A higher-rank match would silently aggregate an entire genus's
    /// occurrences under one species' name, so it does not qualify.
    pub fn is_species_confident(self) -> bool {
        matches!(self, MatchType::Exact | MatchType::Fuzzy | MatchType::Variant)
    }
}

/// A resolved taxon match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesMatch {
    pub usage_key: i64,
    pub match_type: MatchType,
}

/// Basis-of-record partition values used by the analytics engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BasisOfRecord {
    HumanObservation,
    PreservedSpecimen,
    MachineObservation,
}

impl BasisOfRecord {
    pub fn as_str(self) -> &'static str {
        match self {
            BasisOfRecord::HumanObservation => "HUMAN_OBSERVATION",
            BasisOfRecord::PreservedSpecimen => "PRESERVED_SPECIMEN",
            BasisOfRecord::MachineObservation => "MACHINE_OBSERVATION",
        }
    }
}

/// Filter set for an occurrence count or facet query
///
/// All queries are restricted to geo-referenced records without geospatial
/// issues.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OccurrenceFilter {
    pub taxon_key: Option<i64>,
    pub basis_of_record: Option<BasisOfRecord>,
    pub dataset_key: Option<String>,
    /// Single year "2015" or inclusive range "2016,2025"
    pub year: Option<String>,
    /// Inclusive month range within the year filter, e.g. "7,12"
    pub month: Option<String>,
    /// Coordinate uncertainty ceiling in meters
    pub max_coordinate_uncertainty: Option<u32>,
}

impl OccurrenceFilter {
    /// A filter scoped to one taxon key
    pub fn for_taxon(taxon_key: i64) -> Self {
        Self {
            taxon_key: Some(taxon_key),
            ..Self::default()
        }
    }

    pub fn with_basis(mut self, basis: BasisOfRecord) -> Self {
        self.basis_of_record = Some(basis);
        self
    }

    pub fn with_dataset(mut self, dataset_key: impl Into<String>) -> Self {
        self.dataset_key = Some(dataset_key.into());
        self
    }

    pub fn with_years(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_months(mut self, month: impl Into<String>) -> Self {
        self.month = Some(month.into());
        self
    }

    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("hasCoordinate", "true".to_string()),
            ("hasGeospatialIssue", "false".to_string()),
        ];
        if let Some(key) = self.taxon_key {
            pairs.push(("taxonKey", key.to_string()));
        }
        if let Some(basis) = self.basis_of_record {
            pairs.push(("basisOfRecord", basis.as_str().to_string()));
        }
        if let Some(ref dataset) = self.dataset_key {
            pairs.push(("datasetKey", dataset.clone()));
        }
        if let Some(ref year) = self.year {
            pairs.push(("year", year.clone()));
        }
        if let Some(ref month) = self.month {
            pairs.push(("month", month.clone()));
        }
        if let Some(max) = self.max_coordinate_uncertainty {
            pairs.push(("coordinateUncertaintyInMeters", format!("0,{}", max)));
        }
        pairs
    }
}

/// One species facet bucket from a faceted occurrence query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetBucket {
    pub species_key: i64,
    pub count: u64,
}

/// GBIF API client
pub struct GbifClient {
    http: reqwest::Client,
    base_url: String,
}

// Raw upstream payloads; absent fields default rather than erroring.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSpeciesMatch {
    #[serde(default)]
    usage_key: Option<i64>,
    #[serde(default)]
    match_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOccurrenceSearch {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    facets: Vec<RawFacet>,
}

#[derive(Debug, Deserialize)]
struct RawFacet {
    #[serde(default)]
    field: String,
    #[serde(default)]
    counts: Vec<RawFacetCount>,
}

#[derive(Debug, Deserialize)]
struct RawFacetCount {
    #[serde(default)]
    name: String,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSpecies {
    #[serde(default)]
    canonical_name: Option<String>,
    #[serde(default)]
    scientific_name: Option<String>,
}

impl GbifClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Match a free-text scientific name to a canonical taxon
    ///
    /// Returns `None` when the provider finds no usable match at all; a
    /// higher-rank match is returned as such so callers can gate on it.
    pub async fn species_match(&self, name: &str) -> ProviderResult<Option<SpeciesMatch>> {
        let url = format!("{}/species/match", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await?;
        let raw: RawSpeciesMatch = ok_json(response).await?;

        let usage_key = match raw.usage_key {
            Some(key) => key,
            None => return Ok(None),
        };

        let match_type = match raw.match_type.as_deref() {
            Some("EXACT") => MatchType::Exact,
            Some("FUZZY") => MatchType::Fuzzy,
            Some("VARIANT") => MatchType::Variant,
            Some("HIGHERRANK") => MatchType::Higherrank,
            _ => MatchType::None,
        };

        if match_type == MatchType::None {
            return Ok(None);
        }

        Ok(Some(SpeciesMatch {
            usage_key,
            match_type,
        }))
    }

    /// Count occurrences matching a filter set
    pub async fn occurrence_count(&self, filter: &OccurrenceFilter) -> ProviderResult<u64> {
        let url = format!("{}/occurrence/search", self.base_url);
        let mut pairs = filter.query_pairs();
        pairs.push(("limit", "0".to_string()));

        let response = self.http.get(&url).query(&pairs).send().await?;
        let raw: RawOccurrenceSearch = ok_json(response).await?;
        Ok(raw.count)
    }

    /// Per-species occurrence counts for a filter set, via a species facet
    pub async fn species_facets(
        &self,
        filter: &OccurrenceFilter,
    ) -> ProviderResult<Vec<FacetBucket>> {
        let url = format!("{}/occurrence/search", self.base_url);
        let mut pairs = filter.query_pairs();
        pairs.push(("limit", "0".to_string()));
        pairs.push(("facet", "speciesKey".to_string()));
        pairs.push(("facetLimit", FACET_LIMIT.to_string()));

        let response = self.http.get(&url).query(&pairs).send().await?;
        let raw: RawOccurrenceSearch = ok_json(response).await?;

        let buckets = raw
            .facets
            .into_iter()
            .filter(|facet| {
                facet.field.is_empty()
                    || facet.field.eq_ignore_ascii_case("SPECIES_KEY")
                    || facet.field.eq_ignore_ascii_case("speciesKey")
            })
            .flat_map(|facet| facet.counts)
            .filter_map(|count| {
                count.name.parse().ok().map(|species_key| FacetBucket {
                    species_key,
                    count: count.count,
                })
            })
            .collect();

        Ok(buckets)
    }

    /// Display name for a species key
    pub async fn species_name(&self, species_key: i64) -> ProviderResult<Option<String>> {
        let url = format!("{}/species/{}", self.base_url, species_key);
        let response = self.http.get(&url).send().await?;
        let raw: RawSpecies = ok_json(response).await?;
        Ok(raw.canonical_name.or(raw.scientific_name))
    }

    /// Public species page URL for a usage key
    pub fn species_url(&self, usage_key: i64) -> String {
        format!("https://www.gbif.org/species/{}", usage_key)
    }
}

/// Decode a JSON body after checking the response status
pub(super) async fn ok_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> ProviderResult<T> {
    if !response.status().is_success() {
        return Err(ProviderError::Status(response.status()));
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_gate_confidence() {
        assert!(MatchType::Exact.is_species_confident());
        assert!(MatchType::Fuzzy.is_species_confident());
        assert!(MatchType::Variant.is_species_confident());
        assert!(!MatchType::Higherrank.is_species_confident());
        assert!(!MatchType::None.is_species_confident());
    }

    #[test]
    fn test_filter_query_pairs() {
        let filter = OccurrenceFilter::for_taxon(5)
            .with_basis(BasisOfRecord::PreservedSpecimen)
            .with_years("2016,2025")
            .with_months("7,12");
        let pairs = filter.query_pairs();

        assert!(pairs.contains(&("hasCoordinate", "true".to_string())));
        assert!(pairs.contains(&("hasGeospatialIssue", "false".to_string())));
        assert!(pairs.contains(&("taxonKey", "5".to_string())));
        assert!(pairs.contains(&("basisOfRecord", "PRESERVED_SPECIMEN".to_string())));
        assert!(pairs.contains(&("year", "2016,2025".to_string())));
        assert!(pairs.contains(&("month", "7,12".to_string())));
    }

    #[test]
    fn test_uncertainty_ceiling_is_a_range() {
        let filter = OccurrenceFilter {
            max_coordinate_uncertainty: Some(1000),
            ..OccurrenceFilter::default()
        };
        assert!(filter
            .query_pairs()
            .contains(&("coordinateUncertaintyInMeters", "0,1000".to_string())));
    }
}

//! Temporal occurrence-delta aggregation
//!
//! Assembles, for one assessed species, occurrence evidence merged from the
//! providers: a full-range basis-of-record breakdown, the "new since
//! assessment" figures over calendar-aligned windows, crowd-sourced
//! observation samples, and conservation-record fields. Results are cached
//! for one hour; a cache hit is returned with the `cached` flag set.
//!
//! Every individual sub-fetch failure folds to a null contribution. The
//! response is always returned for a valid species id, except when the Red
//! List credential is missing, which is a configuration error.

use crate::cache::{self, DEFAULT_CACHE_TTL};
use crate::error::AppError;
use crate::features::species::breakdown::{self, RecordTypeBreakdown};
use crate::features::species::window::{self, QueryWindow};
use crate::features::FeatureState;
use crate::fanout;
use crate::providers::{
    BasisOfRecord, GbifClient, InatObservation, OccurrenceFilter, INAT_DATASET_KEY,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sample observations returned for thumbnail display
const RECENT_OBSERVATION_LIMIT: u32 = 5;

/// Query parameters of the detail endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailQuery {
    #[serde(rename = "assessmentId")]
    pub assessment_id: Option<i64>,
    /// Scientific name; required for any occurrence statistics
    pub name: Option<String>,
    #[serde(rename = "assessmentYear")]
    pub assessment_year: Option<i32>,
    #[serde(rename = "assessmentMonth")]
    pub assessment_month: Option<u32>,
}

/// Detail endpoint response
///
/// Fields are null where upstream data was unattainable, never omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub sis_taxon_id: i64,
    pub criteria: Option<String>,
    #[serde(rename = "commonName")]
    pub common_name: Option<String>,
    #[serde(rename = "gbifUrl")]
    pub gbif_url: Option<String>,
    #[serde(rename = "gbifOccurrences")]
    pub gbif_occurrences: Option<u64>,
    #[serde(rename = "gbifOccurrencesSinceAssessment")]
    pub gbif_occurrences_since_assessment: Option<u64>,
    #[serde(rename = "gbifByRecordType")]
    pub gbif_by_record_type: Option<RecordTypeBreakdown>,
    #[serde(rename = "gbifNewByRecordType")]
    pub gbif_new_by_record_type: Option<RecordTypeBreakdown>,
    #[serde(rename = "recentInatObservations")]
    pub recent_inat_observations: Vec<InatObservation>,
    #[serde(rename = "inatTotalCount")]
    pub inat_total_count: Option<u64>,
    #[serde(rename = "inatDefaultImage")]
    pub inat_default_image: Option<String>,
    #[serde(rename = "assessmentCount")]
    pub assessment_count: Option<u64>,
    pub cached: bool,
}

#[derive(Debug, Error)]
pub enum DetailError {
    #[error("REDLIST_API_TOKEN is not configured")]
    MissingCredential,
}

impl From<DetailError> for AppError {
    fn from(err: DetailError) -> Self {
        match err {
            DetailError::MissingCredential => AppError::Config(err.to_string()),
        }
    }
}

fn cache_key(sis_id: i64, query: &DetailQuery) -> String {
    let year = query
        .assessment_year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "-".to_string());
    let month = query
        .assessment_month
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("delta:{}:{}:{}", sis_id, year, month)
}

#[tracing::instrument(skip(state, query), fields(sis_id, name = ?query.name))]
pub async fn handle(
    state: &FeatureState,
    sis_id: i64,
    query: DetailQuery,
) -> Result<DetailResponse, DetailError> {
    if !state.providers.redlist.has_credential() {
        return Err(DetailError::MissingCredential);
    }

    let key = cache_key(sis_id, &query);
    if let Some(mut hit) = cache::get_typed::<DetailResponse>(state.cache.as_ref(), &key) {
        hit.cached = true;
        return Ok(hit);
    }

    let gbif = &state.providers.gbif;
    let inat = &state.providers.inat;
    let redlist = &state.providers.redlist;

    // Phase 1: independent lookups, settled together.
    let (record, detail, raw_match) = tokio::join!(
        fanout::settle("conservation record", redlist.conservation_record(sis_id)),
        fanout::settle_opt(
            "assessment detail",
            query.assessment_id.map(|id| redlist.assessment_detail(id)),
        ),
        fanout::settle_opt(
            "taxon match",
            query.name.as_deref().map(|name| gbif.species_match(name)),
        ),
    );

    let raw_match = raw_match.flatten();
    let matched = raw_match.filter(|m| m.match_type.is_species_confident());
    if raw_match.is_some() && matched.is_none() {
        tracing::debug!(
            sis_id,
            "name matched only a broader rank, skipping occurrence statistics"
        );
    }

    let mut response = DetailResponse {
        sis_taxon_id: sis_id,
        criteria: detail.and_then(|d| d.criteria),
        common_name: record.as_ref().and_then(|r| r.common_name.clone()),
        gbif_url: None,
        gbif_occurrences: None,
        gbif_occurrences_since_assessment: None,
        gbif_by_record_type: None,
        gbif_new_by_record_type: None,
        recent_inat_observations: Vec::new(),
        inat_total_count: None,
        inat_default_image: None,
        assessment_count: record.map(|r| r.assessment_count),
        cached: false,
    };

    if let (Some(matched), Some(name)) = (matched, query.name.as_deref()) {
        response.gbif_url = Some(gbif.species_url(matched.usage_key));

        // Phase 3: full-range counts and crowd-sourced supplements. The
        // filters outlive the join since the count futures borrow them.
        let base = OccurrenceFilter::for_taxon(matched.usage_key);
        let human_filter = base.clone().with_basis(BasisOfRecord::HumanObservation);
        let specimen_filter = base.clone().with_basis(BasisOfRecord::PreservedSpecimen);
        let machine_filter = base.clone().with_basis(BasisOfRecord::MachineObservation);
        let crowd_filter = base.clone().with_dataset(INAT_DATASET_KEY);
        let (total, human, specimen, machine, crowd, observations, image) = tokio::join!(
            fanout::settle("total occurrences", gbif.occurrence_count(&base)),
            fanout::settle(
                "human observations",
                gbif.occurrence_count(&human_filter),
            ),
            fanout::settle(
                "preserved specimens",
                gbif.occurrence_count(&specimen_filter),
            ),
            fanout::settle(
                "machine observations",
                gbif.occurrence_count(&machine_filter),
            ),
            fanout::settle(
                "crowd-sourced total",
                gbif.occurrence_count(&crowd_filter),
            ),
            fanout::settle(
                "recent observations",
                inat.recent_observations(name, RECENT_OBSERVATION_LIMIT),
            ),
            fanout::settle("default image", inat.default_image(name)),
        );

        response.gbif_occurrences = total;
        response.gbif_by_record_type = Some(breakdown::reconcile(
            total.unwrap_or(0),
            human.unwrap_or(0),
            specimen.unwrap_or(0),
            machine.unwrap_or(0),
            crowd.unwrap_or(0),
        ));
        if let Some((inat_total, samples)) = observations {
            response.inat_total_count = Some(inat_total);
            response.recent_inat_observations = samples;
        }
        response.inat_default_image = image.flatten();

        // Phase 4: calendar-aligned windows, summed per bucket.
        if let Some(year) = query.assessment_year {
            let windows = window::since_windows(
                year,
                query.assessment_month,
                chrono::Utc::now().year(),
            );
            let results = futures::future::join_all(
                windows
                    .iter()
                    .map(|w| fetch_window(gbif, matched.usage_key, w)),
            )
            .await;

            let mut new = WindowCounts::default();
            for counts in results {
                new.add(&counts);
            }

            response.gbif_occurrences_since_assessment = Some(new.total);
            response.gbif_new_by_record_type = Some(breakdown::reconcile(
                new.total,
                new.human_observation,
                new.preserved_specimen,
                new.machine_observation,
                new.crowd_sourced,
            ));
        }
    }

    cache::set_typed(state.cache.as_ref(), &key, &response, DEFAULT_CACHE_TTL);
    Ok(response)
}

/// Occurrence counts for one temporal window
#[derive(Debug, Default)]
struct WindowCounts {
    total: u64,
    human_observation: u64,
    preserved_specimen: u64,
    machine_observation: u64,
    crowd_sourced: u64,
}

impl WindowCounts {
    fn add(&mut self, other: &WindowCounts) {
        self.total += other.total;
        self.human_observation += other.human_observation;
        self.preserved_specimen += other.preserved_specimen;
        self.machine_observation += other.machine_observation;
        self.crowd_sourced += other.crowd_sourced;
    }
}

/// Query one window with the full basis-of-record partition set
async fn fetch_window(gbif: &GbifClient, taxon_key: i64, window: &QueryWindow) -> WindowCounts {
    let mut base = OccurrenceFilter::for_taxon(taxon_key).with_years(window.year.clone());
    if let Some(ref month) = window.month {
        base = base.with_months(month.clone());
    }
    let human_filter = base.clone().with_basis(BasisOfRecord::HumanObservation);
    let specimen_filter = base.clone().with_basis(BasisOfRecord::PreservedSpecimen);
    let machine_filter = base.clone().with_basis(BasisOfRecord::MachineObservation);
    let crowd_filter = base.clone().with_dataset(INAT_DATASET_KEY);

    let (total, human, specimen, machine, crowd) = tokio::join!(
        fanout::settle("window total", gbif.occurrence_count(&base)),
        fanout::settle(
            "window human observations",
            gbif.occurrence_count(&human_filter),
        ),
        fanout::settle(
            "window preserved specimens",
            gbif.occurrence_count(&specimen_filter),
        ),
        fanout::settle(
            "window machine observations",
            gbif.occurrence_count(&machine_filter),
        ),
        fanout::settle(
            "window crowd-sourced total",
            gbif.occurrence_count(&crowd_filter),
        ),
    );

    WindowCounts {
        total: total.unwrap_or(0),
        human_observation: human.unwrap_or(0),
        preserved_specimen: specimen.unwrap_or(0),
        machine_observation: machine.unwrap_or(0),
        crowd_sourced: crowd.unwrap_or(0),
    }
}

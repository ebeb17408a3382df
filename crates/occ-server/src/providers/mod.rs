//! External provider clients
//!
//! Thin typed wrappers over the third-party biodiversity HTTP JSON APIs.
//! Each call has one explicit result type with exhaustive field mapping and
//! defaults for missing upstream fields, instead of ad hoc optional chaining
//! at the call sites.

pub mod gbif;
pub mod inat;
pub mod literature;
pub mod redlist;

use crate::config::ProviderConfig;
use std::time::Duration;
use thiserror::Error;

pub use gbif::{BasisOfRecord, FacetBucket, GbifClient, MatchType, OccurrenceFilter, SpeciesMatch};
pub use inat::{InatClient, InatObservation};
pub use literature::{LiteratureClient, LiteratureItem};
pub use redlist::{AssessmentDetail, ConservationRecord, RedListClient};

/// GBIF dataset key of the iNaturalist research-grade observations dataset,
/// the crowd-sourced subset tracked inside the human-observation bucket
pub const INAT_DATASET_KEY: &str = "50c9509d-22c7-4a22-a47d-8c48425ef4a7";

/// Result type for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Errors from a single provider call
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("missing credential for {0}")]
    MissingCredential(&'static str),
}

/// All provider clients, sharing one HTTP connection pool
pub struct Providers {
    pub gbif: GbifClient,
    pub inat: InatClient,
    pub redlist: RedListClient,
    pub literature: LiteratureClient,
}

impl Providers {
    /// Build the clients from configuration
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            gbif: GbifClient::new(http.clone(), config.gbif_url.clone()),
            inat: InatClient::new(http.clone(), config.inat_url.clone()),
            redlist: RedListClient::new(
                http.clone(),
                config.redlist_url.clone(),
                config.redlist_token.clone(),
            ),
            literature: LiteratureClient::new(http, config.literature_url.clone()),
        })
    }
}

//! IUCN Red List assessment client
//!
//! Covers the conservation-assessment provider contract. Requests carry the
//! bearer credential supplied out-of-band; its absence is a fatal
//! configuration error for any request needing this client, not a
//! degradable sub-fetch failure.

use super::{ProviderError, ProviderResult};
use serde::Deserialize;

/// Conservation record summary for one species
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConservationRecord {
    pub assessment_count: u64,
    pub common_name: Option<String>,
}

/// Supporting detail of one assessment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentDetail {
    pub criteria: Option<String>,
}

/// Red List API client
pub struct RedListClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTaxonRecord {
    #[serde(default)]
    assessments: Vec<serde_json::Value>,
    #[serde(default)]
    taxon: Option<RawTaxon>,
}

#[derive(Debug, Deserialize)]
struct RawTaxon {
    #[serde(default)]
    common_names: Vec<RawCommonName>,
}

#[derive(Debug, Deserialize)]
struct RawCommonName {
    #[serde(default)]
    main: bool,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAssessment {
    #[serde(default)]
    criteria: Option<String>,
}

impl RedListClient {
    pub fn new(http: reqwest::Client, base_url: String, token: Option<String>) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// Whether the bearer credential is configured
    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    fn token(&self) -> ProviderResult<&str> {
        self.token
            .as_deref()
            .ok_or(ProviderError::MissingCredential("Red List API"))
    }

    /// Conservation record for a species id: assessment count and the main
    /// common name
    pub async fn conservation_record(&self, sis_id: i64) -> ProviderResult<ConservationRecord> {
        let token = self.token()?;
        let url = format!("{}/taxa/sis/{}", self.base_url, sis_id);
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let raw: RawTaxonRecord = super::gbif::ok_json(response).await?;

        let common_name = raw.taxon.and_then(|taxon| {
            let mut names = taxon.common_names;
            names
                .iter()
                .position(|n| n.main)
                .map(|i| names.swap_remove(i))
                .or_else(|| {
                    if names.is_empty() {
                        None
                    } else {
                        Some(names.swap_remove(0))
                    }
                })
                .and_then(|n| n.name)
        });

        Ok(ConservationRecord {
            assessment_count: raw.assessments.len() as u64,
            common_name,
        })
    }

    /// Supporting criteria text for an assessment id
    pub async fn assessment_detail(&self, assessment_id: i64) -> ProviderResult<AssessmentDetail> {
        let token = self.token()?;
        let url = format!("{}/assessment/{}", self.base_url, assessment_id);
        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let raw: RawAssessment = super::gbif::ok_json(response).await?;

        Ok(AssessmentDetail {
            criteria: raw.criteria,
        })
    }
}

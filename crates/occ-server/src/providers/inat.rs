//! iNaturalist observation client
//!
//! Covers the observation-list provider contract: recent crowd-sourced
//! observation samples for thumbnail display and a best default image per
//! taxon.

use super::ProviderResult;
use serde::{Deserialize, Serialize};

/// One crowd-sourced observation sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InatObservation {
    pub id: i64,
    #[serde(default)]
    pub observed_on: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub place_guess: Option<String>,
}

/// iNaturalist API client
pub struct InatClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawObservationSearch {
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    results: Vec<RawObservation>,
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    id: i64,
    #[serde(default)]
    observed_on: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    place_guess: Option<String>,
    #[serde(default)]
    photos: Vec<RawPhoto>,
}

#[derive(Debug, Deserialize)]
struct RawPhoto {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTaxaSearch {
    #[serde(default)]
    results: Vec<RawTaxon>,
}

#[derive(Debug, Deserialize)]
struct RawTaxon {
    #[serde(default)]
    default_photo: Option<RawDefaultPhoto>,
}

#[derive(Debug, Deserialize)]
struct RawDefaultPhoto {
    #[serde(default)]
    medium_url: Option<String>,
}

impl InatClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Recent verifiable observations for a scientific name
    ///
    /// Returns the dataset-wide total alongside up to `limit` samples,
    /// newest first.
    pub async fn recent_observations(
        &self,
        scientific_name: &str,
        limit: u32,
    ) -> ProviderResult<(u64, Vec<InatObservation>)> {
        let url = format!("{}/observations", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("taxon_name", scientific_name),
                ("verifiable", "true"),
                ("order_by", "observed_on"),
                ("order", "desc"),
                ("photos", "true"),
                ("per_page", &limit.to_string()),
            ])
            .send()
            .await?;
        let raw: RawObservationSearch = super::gbif::ok_json(response).await?;

        let observations = raw
            .results
            .into_iter()
            .map(|obs| InatObservation {
                id: obs.id,
                observed_on: obs.observed_on,
                uri: obs.uri,
                photo_url: obs.photos.into_iter().find_map(|p| p.url),
                place_guess: obs.place_guess,
            })
            .collect();

        Ok((raw.total_results, observations))
    }

    /// Best default image for a taxon name
    pub async fn default_image(&self, scientific_name: &str) -> ProviderResult<Option<String>> {
        let url = format!("{}/taxa", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", scientific_name), ("per_page", "1")])
            .send()
            .await?;
        let raw: RawTaxaSearch = super::gbif::ok_json(response).await?;

        Ok(raw
            .results
            .into_iter()
            .next()
            .and_then(|taxon| taxon.default_photo)
            .and_then(|photo| photo.medium_url))
    }
}

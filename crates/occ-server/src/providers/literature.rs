//! Scholarly literature search client
//!
//! Bibliographic search over a Crossref-style works index, used to surface
//! recent publications mentioning a species.

use super::ProviderResult;
use serde::{Deserialize, Serialize};

/// One bibliographic search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteratureItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
}

/// Literature search client
pub struct LiteratureClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawWorksResponse {
    #[serde(default)]
    message: RawMessage,
}

#[derive(Debug, Default, Deserialize)]
struct RawMessage {
    #[serde(default, rename = "total-results")]
    total_results: u64,
    #[serde(default)]
    items: Vec<RawWork>,
}

#[derive(Debug, Deserialize)]
struct RawWork {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default, rename = "DOI")]
    doi: Option<String>,
    #[serde(default)]
    issued: Option<RawIssued>,
    #[serde(default, rename = "container-title")]
    container_title: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawIssued {
    #[serde(default, rename = "date-parts")]
    date_parts: Vec<Vec<i32>>,
}

impl LiteratureClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Search works by bibliographic query, newest metadata first
    pub async fn search(
        &self,
        query: &str,
        rows: u32,
    ) -> ProviderResult<(u64, Vec<LiteratureItem>)> {
        let url = format!("{}/works", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("query.bibliographic", query),
                ("rows", &rows.to_string()),
            ])
            .send()
            .await?;
        let raw: RawWorksResponse = super::gbif::ok_json(response).await?;

        let items = raw
            .message
            .items
            .into_iter()
            .map(|work| LiteratureItem {
                title: work.title.into_iter().next(),
                year: work
                    .issued
                    .and_then(|issued| issued.date_parts.into_iter().next())
                    .and_then(|parts| parts.into_iter().next()),
                doi: work.doi,
                container: work.container_title.into_iter().next(),
            })
            .collect();

        Ok((raw.message.total_results, items))
    }
}

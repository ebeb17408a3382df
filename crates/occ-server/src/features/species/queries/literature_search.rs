//! Scholarly literature search for a species
//!
//! Best-effort bibliographic search on the species' scientific name. A
//! provider failure degrades to an empty result; payloads are cached under
//! the same one-hour TTL as the detail aggregation.

use crate::cache::{self, DEFAULT_CACHE_TTL};
use crate::error::AppError;
use crate::features::FeatureState;
use crate::fanout;
use crate::providers::LiteratureItem;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_ROWS: u32 = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiteratureQuery {
    /// Scientific name to search for
    pub name: Option<String>,
    pub limit: Option<u32>,
}

impl LiteratureQuery {
    fn rows(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_ROWS).clamp(1, DEFAULT_ROWS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiteratureResponse {
    pub total: u64,
    pub items: Vec<LiteratureItem>,
    pub cached: bool,
}

#[derive(Debug, Error)]
pub enum LiteratureError {
    #[error("A scientific name is required")]
    NameRequired,
}

impl From<LiteratureError> for AppError {
    fn from(err: LiteratureError) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[tracing::instrument(skip(state, query), fields(sis_id, name = ?query.name))]
pub async fn handle(
    state: &FeatureState,
    sis_id: i64,
    query: LiteratureQuery,
) -> Result<LiteratureResponse, LiteratureError> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(LiteratureError::NameRequired)?;
    let rows = query.rows();

    let key = format!(
        "literature:{}:{}",
        sis_id,
        cache::fingerprint(&(name, rows))
    );
    if let Some(mut hit) = cache::get_typed::<LiteratureResponse>(state.cache.as_ref(), &key) {
        hit.cached = true;
        return Ok(hit);
    }

    let (total, items) = fanout::settle(
        "literature search",
        state.providers.literature.search(name, rows),
    )
    .await
    .unwrap_or((0, Vec::new()));

    let response = LiteratureResponse {
        total,
        items,
        cached: false,
    };
    cache::set_typed(state.cache.as_ref(), &key, &response, DEFAULT_CACHE_TTL);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_clamped_to_ten() {
        let query = LiteratureQuery {
            limit: Some(50),
            ..LiteratureQuery::default()
        };
        assert_eq!(query.rows(), 10);

        let query = LiteratureQuery {
            limit: Some(0),
            ..LiteratureQuery::default()
        };
        assert_eq!(query.rows(), 1);
    }
}

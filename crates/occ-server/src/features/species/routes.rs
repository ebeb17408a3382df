//! Species routes

use super::queries::{
    literature_search::{self, LiteratureQuery, LiteratureResponse},
    occurrence_delta::{self, DetailQuery, DetailResponse},
};
use crate::error::AppError;
use crate::features::FeatureState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

pub fn species_routes() -> Router<FeatureState> {
    Router::new()
        .route("/:id", get(get_species_detail))
        .route("/:id/literature", get(search_literature))
}

#[tracing::instrument(skip(state, query), fields(sis_id = id))]
async fn get_species_detail(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<DetailResponse>, AppError> {
    let response = occurrence_delta::handle(&state, id, query).await?;

    tracing::debug!(cached = response.cached, "species detail served");
    Ok(Json(response))
}

#[tracing::instrument(skip(state, query), fields(sis_id = id))]
async fn search_literature(
    State(state): State<FeatureState>,
    Path(id): Path<i64>,
    Query(query): Query<LiteratureQuery>,
) -> Result<Json<LiteratureResponse>, AppError> {
    let response = literature_search::handle(&state, id, query).await?;

    tracing::debug!(total = response.total, "literature search served");
    Ok(Json(response))
}

//! Listing routes

use super::queries::{live_listing, snapshot_listing, ListingQuery, ListingResponse};
use crate::error::AppError;
use crate::features::FeatureState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

pub fn listing_routes() -> Router<FeatureState> {
    Router::new().route("/:taxon/species", get(list_species))
}

#[tracing::instrument(
    skip(state, query),
    fields(
        taxon = %taxon,
        page = ?query.page,
        live = query.is_live()
    )
)]
async fn list_species(
    State(state): State<FeatureState>,
    Path(taxon): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingResponse>, AppError> {
    let response = if query.is_live() {
        live_listing::handle(&state, &taxon, query).await?
    } else {
        snapshot_listing::handle(&state, &taxon, query).await?
    };

    tracing::debug!(
        rows = response.data.len(),
        total = response.pagination.total,
        "listing served"
    );

    Ok(Json(response))
}

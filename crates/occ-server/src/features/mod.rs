//! Feature modules implementing the occurrence analytics API
//!
//! Each feature is a vertical slice with its own routes and query handlers:
//!
//! - **listings**: paginated, filterable, statistically-summarized species
//!   listings per taxonomic group (precomputed snapshot or live facet query)
//! - **species**: per-species temporal occurrence breakdown and literature
//!   search
//!
//! Query handlers live under `queries/` with one module per operation, each
//! carrying its own error enum; `routes.rs` maps handler errors to HTTP
//! responses.

pub mod listings;
pub mod shared;
pub mod species;

use crate::cache::Cache;
use crate::providers::Providers;
use crate::registry::TaxonRegistry;
use crate::snapshot::SnapshotStore;
use axum::Router;
use std::sync::Arc;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// Taxon configuration loaded from the data directory
    pub registry: Arc<TaxonRegistry>,
    /// Lazily-loaded per-taxon snapshot corpus
    pub snapshots: Arc<SnapshotStore>,
    /// External provider clients
    pub providers: Arc<Providers>,
    /// Short-lived response cache shared by the aggregation queries
    pub cache: Arc<dyn Cache>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/taxa/:taxon/species` - species listings per taxonomic group
/// - `/species/:id` - per-species occurrence breakdown
/// - `/species/:id/literature` - scholarly literature search
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/taxa", listings::listing_routes().with_state(state.clone()))
        .nest("/species", species::species_routes().with_state(state))
}

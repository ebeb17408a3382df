//! Species listings per taxonomic group
//!
//! Serves paginated, filterable, statistically-summarized species listings
//! in one of two interchangeable modes: the precomputed snapshot occurrence
//! table (default) or a live faceted provider query, selected by the
//! presence of any live-only filter.

pub mod queries;
pub mod routes;
pub mod stats;

pub use routes::listing_routes;

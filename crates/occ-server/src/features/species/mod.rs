//! Per-species occurrence evidence
//!
//! For one assessed species, aggregates occurrence evidence across the
//! providers, partitioned relative to its last conservation assessment, plus
//! a scholarly literature search.

pub mod breakdown;
pub mod queries;
pub mod routes;
pub mod window;

pub use routes::species_routes;

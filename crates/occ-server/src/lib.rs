//! OCC Server Library
//!
//! HTTP server for conservation-status and biodiversity-occurrence analytics.
//!
//! # Overview
//!
//! The server combines a locally maintained snapshot of assessed species with
//! live queries against independent biodiversity data providers:
//!
//! - **Listings**: paginated, filterable, statistically-summarized species
//!   listings per taxonomic group, served from a precomputed snapshot or a
//!   live faceted occurrence query
//! - **Species detail**: a temporally-partitioned breakdown of occurrence
//!   evidence relative to a species' last conservation assessment, merged
//!   from several providers under a short-lived cache
//!
//! # Architecture
//!
//! Features are organized as vertical slices (`features/*`), each with its
//! own routes and query handlers. Shared infrastructure lives alongside:
//!
//! - `snapshot`: per-taxon snapshot corpus with staleness-driven reloads
//! - `providers`: thin typed clients over the external HTTP JSON APIs
//! - `cache`: injectable TTL cache used by the aggregation queries
//! - `registry`: taxon configuration (snapshot files, classification keys)
//! - `fanout`: scatter/gather helper that folds sub-fetch failures to
//!   empty contributions instead of aborting a request
//!
//! # Example
//!
//! ```no_run
//! use occ_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fanout;
pub mod features;
pub mod providers;
pub mod registry;
pub mod snapshot;

// Re-export commonly used types
pub use error::AppError;

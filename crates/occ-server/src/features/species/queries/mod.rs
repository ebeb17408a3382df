//! Species query handlers

pub mod literature_search;
pub mod occurrence_delta;

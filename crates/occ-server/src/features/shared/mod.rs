//! Shared utilities for feature slices

pub mod pagination;

pub use pagination::{PageMeta, PageParams};

//! OCC Common Library
//!
//! Shared error handling and logging setup for the occurrence analytics
//! platform workspace.
//!
//! # Overview
//!
//! This crate provides functionality used by every OCC workspace member:
//!
//! - **Error Handling**: the `OccError` type and `Result` alias
//! - **Logging**: `tracing`-based logging initialization with console and
//!   file targets

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{OccError, Result};

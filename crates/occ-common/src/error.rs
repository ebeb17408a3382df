//! Error types for OCC

use thiserror::Error;

/// Result type alias for OCC operations
pub type Result<T> = std::result::Result<T, OccError>;

/// Main error type for OCC
#[derive(Error, Debug)]
pub enum OccError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

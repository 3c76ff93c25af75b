//! Error types for ps-output.

use thiserror::Error;

use ps_core::Crs;

/// Errors that can occur when exporting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid GeoJSON feature: {0}")]
    GeoJson(String),

    #[error("GeoJSON coordinates must be geographic, network is in {0}")]
    NotGeographic(Crs),
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;

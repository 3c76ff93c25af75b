//! Spatial-subsystem error type.

use thiserror::Error;

use ps_core::CoreError;

/// Errors produced by `ps-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("network fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty road network: {0}")]
    EmptyNetwork(String),

    #[error("no edge has a maxspeed and no highway or fallback speed applies to {0:?}")]
    NoSpeeds(String),

    #[error("edge speeds must be added before travel times")]
    SpeedsMissing,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;

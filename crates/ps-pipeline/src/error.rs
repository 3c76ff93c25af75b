//! Pipeline-level error type.

use thiserror::Error;

use ps_ingest::IngestError;
use ps_output::OutputError;
use ps_spatial::SpatialError;

/// One variant per failure class; every one aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("input error: {0}")]
    Ingest(#[from] IngestError),

    #[error("no pole has a usable POLE_LOC ({dropped} of {total} rows dropped)")]
    NoValidPoles { total: usize, dropped: usize },

    #[error("road network error: {0}")]
    Network(#[from] SpatialError),

    #[error("export error: {0}")]
    Output(#[from] OutputError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

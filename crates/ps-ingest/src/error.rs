use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("input directory {0} does not exist")]
    MissingDirectory(PathBuf),

    #[error("no pole files could be loaded from {dir} ({attempted} expected)")]
    NoFilesLoaded { dir: PathBuf, attempted: usize },

    #[error("{file}: missing required column {column:?}")]
    MissingColumn { file: String, column: &'static str },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IngestResult<T> = Result<T, IngestError>;

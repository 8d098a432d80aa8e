use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or inconsistent tariff configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The persisted sums already carry the date being exported.
    #[error("{path} already holds sums for {date}, the export may have been run twice")]
    DuplicateRun { date: String, path: PathBuf },

    #[error("payload has no series at index {index} ({what})")]
    MissingSeries { index: usize, what: String },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("unparseable timestamp `{0}`")]
    Timestamp(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error("Snapshot '{0}' does not exist")]
    MissingSnapshot(PathBuf),

    #[error("Failed to read snapshot '{0}'")]
    SnapshotRead(PathBuf, #[source] PolarsError),

    #[error("Failed computing quality metrics: {0}")]
    Metrics(#[from] PolarsError),
}

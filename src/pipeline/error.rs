use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to create output directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("I/O error writing snapshot '{0}'")]
    WriteIo(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing snapshot '{0}'")]
    WritePolars(PathBuf, #[source] PolarsError),

    #[error("Failed to move finished snapshot into place at '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Failed to combine city frames for snapshot '{0}'")]
    Stack(String, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

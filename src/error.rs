use crate::config::error::ConfigError;
use crate::http::error::FetchError;
use crate::pipeline::error::SnapshotError;
use crate::quality::error::QualityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Http(#[from] FetchError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Quality(#[from] QualityError),
}

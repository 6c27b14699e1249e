use crate::types::data_source::ApiSource;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse configuration")]
    Parse(#[source] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A source was needed but its credential is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{} not set", .api.credential_var())]
pub struct MissingCredential {
    pub api: ApiSource,
}

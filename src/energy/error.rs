use crate::config::error::MissingCredential;
use crate::http::error::FetchError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnergyError {
    #[error(transparent)]
    Credential(#[from] MissingCredential),

    #[error("Energy request for region {region} failed")]
    Fetch {
        region: String,
        #[source]
        source: FetchError,
    },

    #[error("Unexpected energy response for region {region}: {message}")]
    UnexpectedShape { region: String, message: String },

    #[error("No fallback series for {region}")]
    UnmappedRegion { region: String },

    #[error("Fallback response for series {series_id} contains no series")]
    MissingSeries { series_id: String },

    #[error("Failed normalizing energy data for region {region}")]
    Normalize {
        region: String,
        #[source]
        source: PolarsError,
    },
}

impl EnergyError {
    /// Gaps in coverage are logged as warnings, broken plumbing as errors.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            EnergyError::UnexpectedShape { .. }
                | EnergyError::UnmappedRegion { .. }
                | EnergyError::MissingSeries { .. }
        )
    }
}

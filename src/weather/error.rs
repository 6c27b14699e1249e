use crate::config::error::MissingCredential;
use crate::http::error::FetchError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Credential(#[from] MissingCredential),

    #[error("Weather request for station {station} failed")]
    Fetch {
        station: String,
        #[source]
        source: FetchError,
    },

    #[error("No 'results' in weather response for station {station}")]
    MissingResults { station: String },

    #[error("Unexpected weather response for station {station}: {message}")]
    UnexpectedShape { station: String, message: String },

    #[error("Failed reshaping weather data for station {station}")]
    Reshape {
        station: String,
        #[source]
        source: PolarsError,
    },
}

impl WeatherError {
    /// Response-shape problems are expected from time to time and only warrant a warning.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            WeatherError::MissingResults { .. } | WeatherError::UnexpectedShape { .. }
        )
    }
}

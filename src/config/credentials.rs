use crate::config::error::MissingCredential;
use crate::types::data_source::ApiSource;
use std::env;
use std::fmt;

/// API credentials for one pipeline run, resolved once and handed to each fetcher.
///
/// A missing credential is not an error here; it only becomes one when a fetcher
/// asks for it through [`Credentials::require`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    noaa_token: Option<String>,
    eia_api_key: Option<String>,
}

impl Credentials {
    pub fn new(noaa_token: Option<String>, eia_api_key: Option<String>) -> Self {
        Self {
            noaa_token: noaa_token.filter(|s| !s.trim().is_empty()),
            eia_api_key: eia_api_key.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Reads `NOAA_API_KEY` and `EIA_API_KEY` from the process environment.
    pub fn from_env() -> Self {
        Self::new(
            env::var(ApiSource::Noaa.credential_var()).ok(),
            env::var(ApiSource::Eia.credential_var()).ok(),
        )
    }

    pub fn require(&self, api: ApiSource) -> Result<&str, MissingCredential> {
        let value = match api {
            ApiSource::Noaa => self.noaa_token.as_deref(),
            ApiSource::Eia => self.eia_api_key.as_deref(),
        };
        value.ok_or(MissingCredential { api })
    }

    pub fn missing(&self) -> Vec<ApiSource> {
        [ApiSource::Noaa, ApiSource::Eia]
            .into_iter()
            .filter(|api| self.require(*api).is_err())
            .collect()
    }
}

// Keeps keys out of logs and panic messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("noaa_token", &self.noaa_token.as_ref().map(|_| "***"))
            .field("eia_api_key", &self.eia_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

use crate::config::error::ConfigError;
use crate::http::retry_client::RetryPolicy;
use crate::types::city::CityConfig;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
const DEFAULT_EIA_FALLBACK_URL: &str = "https://api.eia.gov/series/";

#[derive(Debug, Clone, Deserialize)]
pub struct DataSources {
    pub noaa_base_url: String,
    pub eia_base_url: String,
    #[serde(default = "default_fallback_url")]
    pub eia_fallback_url: String,
    /// Extra or replacement `region_code -> series_id` entries for the legacy API.
    #[serde(default)]
    pub fallback_series: BTreeMap<String, String>,
}

fn default_fallback_url() -> String {
    DEFAULT_EIA_FALLBACK_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub backoff_base_secs: f64,
    pub timeout_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_secs: 1.0,
            timeout_secs: 30,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> Result<RetryPolicy, ConfigError> {
        let backoff_base = Duration::try_from_secs_f64(self.backoff_base_secs).map_err(|_| {
            ConfigError::Invalid(format!(
                "retry.backoff_base_secs must be a non-negative number, got {}",
                self.backoff_base_secs
            ))
        })?;
        Ok(RetryPolicy::builder()
            .max_retries(self.max_retries)
            .backoff_base(backoff_base)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build())
    }
}

/// Static pipeline configuration, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub cities: Vec<CityConfig>,
    pub data_sources: DataSources,
    #[serde(default)]
    pub retry: RetrySettings,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_yaml::from_str(contents).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for city in &self.cities {
            if city.name.trim().is_empty() {
                return Err(ConfigError::Invalid("city with an empty name".into()));
            }
            if city.station_id.trim().is_empty() || city.region_code.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "city '{}' needs both station_id and region_code",
                    city.name
                )));
            }
            if !seen.insert(city.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "city '{}' is listed twice",
                    city.name
                )));
            }
        }
        self.retry.policy()?;
        Ok(())
    }
}

//! Defines the per-city configuration record read from the pipeline configuration.

use serde::{Deserialize, Serialize};

/// A city whose weather and electricity demand the pipeline collects.
///
/// # Examples
///
/// ```
/// use grid_weather::CityConfig;
///
/// let city = CityConfig::new("Seattle", "GHCND:USW00024233", "SCL");
/// assert_eq!(city.region_code, "SCL");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityConfig {
    /// Display name, written to the `city` column of both snapshots.
    pub name: String,
    /// NOAA GHCND station identifier (e.g. "GHCND:USW00094728").
    pub station_id: String,
    /// EIA balancing authority / respondent code (e.g. "NYIS").
    pub region_code: String,
}

impl CityConfig {
    pub fn new(
        name: impl Into<String>,
        station_id: impl Into<String>,
        region_code: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            station_id: station_id.into(),
            region_code: region_code.into(),
        }
    }
}

//! Identifies the external sources the pipeline reads from.

use std::fmt;

/// The external API a request or credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiSource {
    /// NOAA Climate Data Online, GHCND daily summaries.
    Noaa,
    /// EIA API v2 daily region data.
    Eia,
}

impl ApiSource {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ApiSource::Noaa => "NOAA",
            ApiSource::Eia => "EIA",
        }
    }

    /// Environment variable holding the credential for this source.
    pub fn credential_var(&self) -> &'static str {
        match self {
            ApiSource::Noaa => "NOAA_API_KEY",
            ApiSource::Eia => "EIA_API_KEY",
        }
    }
}

impl fmt::Display for ApiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which EIA endpoint produced a city's energy rows.
///
/// Written verbatim to the `source` column of the energy snapshot.
///
/// # Examples
///
/// ```
/// use grid_weather::EnergySource;
///
/// assert_eq!(EnergySource::Fallback.to_string(), "fallback");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnergySource {
    /// The v2 daily time-series API.
    Primary,
    /// The legacy hourly series API, resampled to days.
    Fallback,
}

impl EnergySource {
    pub(crate) fn column_value(&self) -> &'static str {
        match self {
            EnergySource::Primary => "primary",
            EnergySource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column_value())
    }
}

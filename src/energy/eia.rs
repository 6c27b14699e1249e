use crate::config::credentials::Credentials;
use crate::energy::error::EnergyError;
use crate::energy::normalize::{fallback_frame, primary_frame, DemandRecord};
use crate::energy::series::SeriesTable;
use crate::http::retry_client::RetryClient;
use crate::http::transport::JsonTransport;
use crate::types::city::CityConfig;
use crate::types::data_source::{ApiSource, EnergySource};
use crate::types::date_window::DateWindow;
use log::{info, warn};
use polars::frame::DataFrame;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Page size of the v2 request; a 90 day window for one respondent fits easily.
pub const PAGE_LENGTH: usize = 5000;

#[derive(Debug, Deserialize)]
struct V2Envelope {
    response: V2Response,
}

#[derive(Debug, Deserialize)]
struct V2Response {
    #[serde(default)]
    data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct SeriesEnvelope {
    #[serde(default)]
    series: Vec<LegacySeries>,
}

#[derive(Debug, Deserialize)]
struct LegacySeries {
    #[serde(default)]
    units: Option<String>,
    #[serde(default)]
    data: Vec<(Value, Option<f64>)>,
}

/// Normalized daily demand plus the path it came from.
#[derive(Debug, Clone)]
pub struct EnergyFetch {
    pub frame: DataFrame,
    pub source: EnergySource,
}

/// Client for EIA daily demand: the v2 region-data route first, the legacy hourly
/// series route when that fails or comes back empty.
pub struct EiaFetcher<T> {
    http: Arc<RetryClient<T>>,
    base_url: String,
    fallback_url: String,
    series: SeriesTable,
    credentials: Credentials,
}

impl<T: JsonTransport> EiaFetcher<T> {
    pub fn new(
        http: Arc<RetryClient<T>>,
        base_url: impl Into<String>,
        fallback_url: impl Into<String>,
        series: SeriesTable,
        credentials: Credentials,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            fallback_url: fallback_url.into(),
            series,
            credentials,
        }
    }

    pub fn series(&self) -> &SeriesTable {
        &self.series
    }

    /// Daily demand for a city's region in the energy snapshot schema.
    ///
    /// A missing key fails before any request. Any primary failure, or a primary
    /// response without rows, is logged and the fallback path is tried instead.
    pub async fn fetch(
        &self,
        city: &CityConfig,
        window: &DateWindow,
    ) -> Result<EnergyFetch, EnergyError> {
        self.credentials.require(ApiSource::Eia)?;

        match self.fetch_primary(city, window).await {
            Ok(frame) if frame.height() > 0 => {
                return Ok(EnergyFetch {
                    frame,
                    source: EnergySource::Primary,
                })
            }
            Ok(_) => warn!(
                "EIA v2 returned no rows for {}, trying fallback series",
                city.region_code
            ),
            Err(e) => warn!(
                "EIA v2 failed for {}: {}, trying fallback series",
                city.region_code, e
            ),
        }

        let frame = self.fetch_fallback(city, window).await?;
        Ok(EnergyFetch {
            frame,
            source: EnergySource::Fallback,
        })
    }

    pub async fn fetch_primary(
        &self,
        city: &CityConfig,
        window: &DateWindow,
    ) -> Result<DataFrame, EnergyError> {
        let region = city.region_code.as_str();
        let key = self.credentials.require(ApiSource::Eia)?;
        let headers = [("X-Api-Key".to_string(), key.to_string())];

        let value = self
            .http
            .fetch(&self.base_url, &primary_params(region, window), &headers)
            .await
            .map_err(|e| EnergyError::Fetch {
                region: region.to_string(),
                source: e,
            })?;

        let envelope =
            V2Envelope::deserialize(&value).map_err(|e| EnergyError::UnexpectedShape {
                region: region.to_string(),
                message: e.to_string(),
            })?;

        let records: Vec<DemandRecord> = envelope
            .response
            .data
            .iter()
            .filter_map(|item| DemandRecord::deserialize(item).ok())
            .collect();
        let dropped = envelope.response.data.len() - records.len();
        if dropped > 0 {
            warn!("Skipped {} malformed demand rows for {}", dropped, region);
        }

        primary_frame(&records, &city.name, region, window).map_err(|e| {
            EnergyError::Normalize {
                region: region.to_string(),
                source: e,
            }
        })
    }

    pub async fn fetch_fallback(
        &self,
        city: &CityConfig,
        window: &DateWindow,
    ) -> Result<DataFrame, EnergyError> {
        let region = city.region_code.as_str();
        let key = self.credentials.require(ApiSource::Eia)?;
        let series_id =
            self.series
                .series_id(region)
                .ok_or_else(|| EnergyError::UnmappedRegion {
                    region: region.to_string(),
                })?;

        let params = [
            ("api_key".to_string(), key.to_string()),
            ("series_id".to_string(), series_id.to_string()),
        ];
        let value = self
            .http
            .fetch(&self.fallback_url, &params, &[])
            .await
            .map_err(|e| EnergyError::Fetch {
                region: region.to_string(),
                source: e,
            })?;

        let envelope =
            SeriesEnvelope::deserialize(&value).map_err(|e| EnergyError::UnexpectedShape {
                region: region.to_string(),
                message: e.to_string(),
            })?;
        let series = envelope
            .series
            .into_iter()
            .next()
            .ok_or_else(|| EnergyError::MissingSeries {
                series_id: series_id.to_string(),
            })?;

        let points: Vec<(String, Option<f64>)> = series
            .data
            .into_iter()
            .map(|(timestamp, value)| (timestamp_text(timestamp), value))
            .collect();
        info!(
            "Fallback series {} returned {} hourly points",
            series_id,
            points.len()
        );

        let units = series.units.unwrap_or_default();
        fallback_frame(&points, &units, &city.name, region, window).map_err(|e| {
            EnergyError::Normalize {
                region: region.to_string(),
                source: e,
            }
        })
    }
}

/// Series timestamps are usually strings but show up as bare numbers too.
fn timestamp_text(raw: Value) -> String {
    match raw {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn primary_params(region: &str, window: &DateWindow) -> Vec<(String, String)> {
    [
        ("frequency", "daily".to_string()),
        ("data[0]", "value".to_string()),
        ("facets[respondent][]", region.to_string()),
        ("facets[type][]", "D".to_string()),
        ("start", window.start_param()),
        ("end", window.end_param()),
        ("sort[0][column]", "period".to_string()),
        ("sort[0][direction]", "asc".to_string()),
        ("offset", "0".to_string()),
        ("length", PAGE_LENGTH.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

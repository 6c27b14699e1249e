use crate::config::credentials::Credentials;
use crate::http::retry_client::RetryClient;
use crate::http::transport::JsonTransport;
use crate::types::city::CityConfig;
use crate::types::data_source::ApiSource;
use crate::types::date_window::DateWindow;
use crate::weather::error::WeatherError;
use crate::weather::reshape::{weather_frame, NoaaObservation, TMAX, TMIN};
use log::{info, warn};
use polars::frame::DataFrame;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const DATASET_ID: &str = "GHCND";
/// NOAA CDO rejects larger pages.
pub const PAGE_LIMIT: usize = 1000;
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct NoaaPage {
    metadata: Option<NoaaMetadata>,
    results: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct NoaaMetadata {
    resultset: ResultSet,
}

#[derive(Debug, Deserialize)]
struct ResultSet {
    count: usize,
}

/// Client for the NOAA Climate Data Online `data` endpoint.
pub struct NoaaFetcher<T> {
    http: Arc<RetryClient<T>>,
    base_url: String,
    credentials: Credentials,
}

impl<T: JsonTransport> NoaaFetcher<T> {
    pub fn new(http: Arc<RetryClient<T>>, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    /// Daily TMAX/TMIN for a city as a `date, city, tmax, tmin` frame in °F.
    pub async fn fetch(
        &self,
        city: &CityConfig,
        window: &DateWindow,
    ) -> Result<DataFrame, WeatherError> {
        let observations = self.fetch_weather(&city.station_id, window).await?;
        weather_frame(&observations, &city.name, window).map_err(|e| WeatherError::Reshape {
            station: city.station_id.clone(),
            source: e,
        })
    }

    /// Raw observations for a station, following pagination until every result is read.
    pub async fn fetch_weather(
        &self,
        station_id: &str,
        window: &DateWindow,
    ) -> Result<Vec<NoaaObservation>, WeatherError> {
        let token = self.credentials.require(ApiSource::Noaa)?;
        let headers = [("token".to_string(), token.to_string())];

        let mut raw = Vec::new();
        let mut offset = 1;
        let mut total = 0;
        let mut complete = false;

        for page_index in 0..MAX_PAGES {
            let params = page_params(station_id, window, offset);
            let value = self
                .http
                .fetch(&self.base_url, &params, &headers)
                .await
                .map_err(|e| WeatherError::Fetch {
                    station: station_id.to_string(),
                    source: e,
                })?;

            let page = NoaaPage::deserialize(&value).map_err(|e| WeatherError::UnexpectedShape {
                station: station_id.to_string(),
                message: e.to_string(),
            })?;

            let Some(results) = page.results else {
                if page_index == 0 {
                    return Err(WeatherError::MissingResults {
                        station: station_id.to_string(),
                    });
                }
                complete = true;
                break;
            };

            let received = results.len();
            raw.extend(results);
            offset += received;

            total = page.metadata.map(|m| m.resultset.count).unwrap_or(0);
            if received == 0 || offset > total {
                complete = true;
                break;
            }
            info!(
                "Station {}: {} of {} results read, requesting next page",
                station_id,
                offset - 1,
                total
            );
        }

        if !complete {
            warn!(
                "Station {}: page limit of {} reached, {} of {} results not read",
                station_id,
                MAX_PAGES,
                total.saturating_sub(raw.len()),
                total
            );
        }

        let mut observations = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for item in &raw {
            match NoaaObservation::deserialize(item) {
                Ok(obs) => observations.push(obs),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Skipped {} malformed weather results for station {}", skipped, station_id);
        }

        Ok(observations)
    }
}

#[cfg(test)]
impl<T> NoaaFetcher<T> {
    pub(crate) fn client(&self) -> &RetryClient<T> {
        &self.http
    }
}

fn page_params(station_id: &str, window: &DateWindow, offset: usize) -> Vec<(String, String)> {
    vec![
        ("datasetid".to_string(), DATASET_ID.to_string()),
        ("stationid".to_string(), station_id.to_string()),
        ("startdate".to_string(), window.start_param()),
        ("enddate".to_string(), window.end_param()),
        ("datatypeid".to_string(), TMAX.to_string()),
        ("datatypeid".to_string(), TMIN.to_string()),
        ("limit".to_string(), PAGE_LIMIT.to_string()),
        ("offset".to_string(), offset.to_string()),
    ]
}

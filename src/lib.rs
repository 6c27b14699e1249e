mod config;
mod energy;
mod error;
mod http;
mod logging;
mod pipeline;
mod quality;
mod types;
mod weather;

pub use error::PipelineError;

pub use config::app_config::{AppConfig, DataSources, RetrySettings, DEFAULT_CONFIG_PATH};
pub use config::credentials::Credentials;
pub use config::error::{ConfigError, MissingCredential};

pub use http::error::FetchError;
pub use http::retry_client::{RetryClient, RetryPolicy};
pub use http::transport::{JsonTransport, Pairs, ReqwestTransport};

pub use types::city::CityConfig;
pub use types::data_source::{ApiSource, EnergySource};
pub use types::date_window::DateWindow;

pub use weather::error::WeatherError;
pub use weather::noaa::NoaaFetcher;
pub use weather::reshape::{tenths_celsius_to_fahrenheit, weather_frame, NoaaObservation, WEATHER_COLUMNS};

pub use energy::eia::{EiaFetcher, EnergyFetch};
pub use energy::error::EnergyError;
pub use energy::normalize::{
    fallback_frame, parse_series_timestamp, primary_frame, DemandRecord, ENERGY_COLUMNS,
};
pub use energy::series::SeriesTable;

pub use pipeline::error::SnapshotError;
pub use pipeline::orchestrator::HistoricalPipeline;
pub use pipeline::report::{CityReport, RunReport, SourceOutcome};
pub use pipeline::snapshot::{ENERGY_SNAPSHOT, WEATHER_SNAPSHOT};

pub use quality::clean::{detect_staleness, merge_and_clean};
pub use quality::error::QualityError;
pub use quality::report::{CoverageGap, Freshness, QualityReport, DEFAULT_STALE_AFTER_DAYS};

pub use logging::{init_file_logger, LoggingError, DEFAULT_LOG_FILE};

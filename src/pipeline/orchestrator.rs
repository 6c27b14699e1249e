//! Runs both fetchers for every configured city and persists the two snapshots.

use crate::config::app_config::AppConfig;
use crate::config::credentials::Credentials;
use crate::energy::eia::EiaFetcher;
use crate::energy::series::SeriesTable;
use crate::error::PipelineError;
use crate::http::retry_client::RetryClient;
use crate::http::transport::JsonTransport;
use crate::pipeline::report::{CityReport, RunReport, SourceOutcome};
use crate::pipeline::snapshot::{stack_frames, write_snapshot, ENERGY_SNAPSHOT, WEATHER_SNAPSHOT};
use crate::types::city::CityConfig;
use crate::types::date_window::DateWindow;
use crate::weather::noaa::NoaaFetcher;
use bon::bon;
use log::{error, info, warn};
use polars::frame::DataFrame;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fetches a window of weather and demand data for every configured city and writes
/// `weather.csv` and `energy.csv` into the output directory.
///
/// Cities are processed one after another, weather before energy. A failing city or
/// source is logged, recorded in the [`RunReport`] and skipped; it never aborts the
/// run. Only configuration and snapshot I/O errors are returned.
///
/// # Examples
///
/// ```rust,no_run
/// # use grid_weather::{AppConfig, Credentials, DateWindow, HistoricalPipeline, ReqwestTransport};
/// # use chrono::Local;
/// # use std::path::Path;
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::load(Path::new("config/config.yaml"))?;
/// let pipeline = HistoricalPipeline::builder()
///     .config(&config)
///     .credentials(Credentials::from_env())
///     .transport(ReqwestTransport::new()?)
///     .output_dir("data")
///     .build()?;
///
/// let window = DateWindow::trailing_days(Local::now().date_naive(), 90)
///     .ok_or("window before the earliest representable date")?;
/// let report = pipeline.run(&window).await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub struct HistoricalPipeline<T> {
    cities: Vec<CityConfig>,
    noaa: NoaaFetcher<T>,
    eia: EiaFetcher<T>,
    output_dir: PathBuf,
}

#[bon]
impl<T: JsonTransport> HistoricalPipeline<T> {
    /// Wires both fetchers to one retrying client over `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the retry settings are invalid.
    #[builder]
    pub fn new(
        config: &AppConfig,
        credentials: Credentials,
        transport: T,
        #[builder(into)] output_dir: PathBuf,
    ) -> Result<Self, PipelineError> {
        let http = Arc::new(RetryClient::new(transport, config.retry.policy()?));
        let sources = &config.data_sources;

        let noaa = NoaaFetcher::new(
            Arc::clone(&http),
            sources.noaa_base_url.clone(),
            credentials.clone(),
        );
        let eia = EiaFetcher::new(
            http,
            sources.eia_base_url.clone(),
            sources.eia_fallback_url.clone(),
            SeriesTable::with_overrides(&sources.fallback_series),
            credentials,
        );

        Ok(Self {
            cities: config.cities.clone(),
            noaa,
            eia,
            output_dir,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs the pipeline once for `window`.
    pub async fn run(&self, window: &DateWindow) -> Result<RunReport, PipelineError> {
        info!(
            "Starting historical fetch for {} cities over {}",
            self.cities.len(),
            window
        );
        for city in &self.cities {
            if self.eia.series().series_id(&city.region_code).is_none() {
                warn!(
                    "No fallback series for {} ({}); energy depends on the primary API only",
                    city.region_code, city.name
                );
            }
        }

        let mut weather_frames = Vec::with_capacity(self.cities.len());
        let mut energy_frames = Vec::with_capacity(self.cities.len());
        let mut cities = Vec::with_capacity(self.cities.len());

        for city in &self.cities {
            let weather = self.collect_weather(city, window, &mut weather_frames).await;
            let energy = self.collect_energy(city, window, &mut energy_frames).await;
            cities.push(CityReport {
                city: city.name.clone(),
                weather,
                energy,
            });
        }

        let weather_snapshot = self.persist(weather_frames, WEATHER_SNAPSHOT).await?;
        let energy_snapshot = self.persist(energy_frames, ENERGY_SNAPSHOT).await?;

        let report = RunReport {
            window: *window,
            cities,
            weather_snapshot,
            energy_snapshot,
        };
        info!(
            "Historical fetch finished: {} weather rows, {} energy rows, {} failures",
            report.weather_rows(),
            report.energy_rows(),
            report.failures()
        );
        Ok(report)
    }

    async fn collect_weather(
        &self,
        city: &CityConfig,
        window: &DateWindow,
        frames: &mut Vec<DataFrame>,
    ) -> SourceOutcome {
        info!("Fetching NOAA for {}", city.name);
        match self.noaa.fetch(city, window).await {
            Ok(df) if df.height() == 0 => {
                warn!("No weather rows for {} in {}", city.name, window);
                SourceOutcome::Empty
            }
            Ok(df) => {
                let count = df.height();
                info!("Weather for {}: {} rows", city.name, count);
                frames.push(df);
                SourceOutcome::Rows { count, source: None }
            }
            Err(e) if e.is_warning() => {
                warn!("Skipping weather for {}: {}", city.name, e);
                SourceOutcome::Skipped(e.to_string())
            }
            Err(e) => {
                let message = describe(&e);
                error!("Weather fetch failed for {}: {}", city.name, message);
                SourceOutcome::Failed(message)
            }
        }
    }

    async fn collect_energy(
        &self,
        city: &CityConfig,
        window: &DateWindow,
        frames: &mut Vec<DataFrame>,
    ) -> SourceOutcome {
        info!("Fetching EIA for {} ({})", city.name, city.region_code);
        match self.eia.fetch(city, window).await {
            Ok(fetched) if fetched.frame.height() == 0 => {
                warn!("No energy rows for {} in {}", city.region_code, window);
                SourceOutcome::Empty
            }
            Ok(fetched) => {
                let count = fetched.frame.height();
                info!(
                    "Energy for {}: {} rows from {} source",
                    city.name, count, fetched.source
                );
                frames.push(fetched.frame);
                SourceOutcome::Rows {
                    count,
                    source: Some(fetched.source),
                }
            }
            Err(e) if e.is_warning() => {
                warn!("Skipping energy for {}: {}", city.name, e);
                SourceOutcome::Skipped(e.to_string())
            }
            Err(e) => {
                let message = describe(&e);
                error!("Energy fetch failed for {}: {}", city.name, message);
                SourceOutcome::Failed(message)
            }
        }
    }

    async fn persist(
        &self,
        frames: Vec<DataFrame>,
        file_name: &str,
    ) -> Result<Option<PathBuf>, PipelineError> {
        match stack_frames(file_name, frames)? {
            Some(df) => Ok(Some(write_snapshot(df, &self.output_dir, file_name).await?)),
            None => {
                warn!(
                    "No rows collected for {}, leaving any previous snapshot in place",
                    file_name
                );
                Ok(None)
            }
        }
    }
}

/// An error and its sources on one line.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::{MockTransport, Reply};
    use crate::types::data_source::EnergySource;
    use chrono::NaiveDate;
    use polars::prelude::*;
    use serde_json::{json, Value};
    use std::collections::BTreeSet;

    const NOAA_URL: &str = "https://noaa.test/data";
    const EIA_URL: &str = "https://eia.test/v2/data/";
    const SERIES_URL: &str = "https://eia.test/series/";

    const CITIES: [(&str, &str, &str); 3] = [
        ("New York", "GHCND:USW00094728", "NYIS"),
        ("Chicago", "GHCND:USW00094846", "PJM"),
        ("Houston", "GHCND:USW00012960", "ERCO"),
    ];

    fn config(cities: &[(&str, &str, &str)]) -> AppConfig {
        let mut yaml = format!(
            "data_sources:\n  noaa_base_url: {}\n  eia_base_url: {}\n  eia_fallback_url: {}\n\
             retry:\n  max_retries: 1\n  backoff_base_secs: 0.0\ncities:\n",
            NOAA_URL, EIA_URL, SERIES_URL
        );
        for (name, station, region) in cities {
            yaml.push_str(&format!(
                "  - name: {}\n    station_id: \"{}\"\n    region_code: {}\n",
                name, station, region
            ));
        }
        AppConfig::from_yaml_str(&yaml).expect("test config is valid")
    }

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
        )
        .unwrap()
    }

    fn creds() -> Credentials {
        Credentials::new(Some("noaa-token".into()), Some("eia-key".into()))
    }

    fn noaa_body(base: i64) -> Value {
        let results: Vec<Value> = (1..=3)
            .flat_map(|day| {
                [("TMAX", base + day * 10), ("TMIN", base - 100 + day * 10)].map(|(kind, value)| {
                    json!({"date": format!("2025-01-0{}T00:00:00", day), "datatype": kind, "value": value})
                })
            })
            .collect();
        json!({"metadata": {"resultset": {"offset": 1, "count": results.len(), "limit": 1000}}, "results": results})
    }

    fn eia_body(region: &str, base: f64) -> Value {
        let data: Vec<Value> = (1..=3)
            .map(|day| {
                json!({"period": format!("2025-01-0{}", day), "respondent": region,
                       "respondent-name": format!("{} operator", region), "type": "D",
                       "value": base + f64::from(day), "value-units": "megawatthours"})
            })
            .collect();
        json!({"response": {"total": data.len(), "data": data}})
    }

    fn healthy_transport(cities: &[(&str, &str, &str)]) -> MockTransport {
        cities
            .iter()
            .enumerate()
            .fold(MockTransport::new(), |mock, (i, (_, station, region))| {
                mock.route(NOAA_URL, &[("stationid", *station)], [Reply::json(noaa_body(100 * i as i64))])
                    .route(EIA_URL, &[("facets[respondent][]", *region)], [Reply::json(eia_body(region, 1000.0 * i as f64))])
            })
    }

    fn pipeline(
        cities: &[(&str, &str, &str)],
        transport: MockTransport,
        credentials: Credentials,
        dir: &Path,
    ) -> HistoricalPipeline<MockTransport> {
        HistoricalPipeline::builder()
            .config(&config(cities))
            .credentials(credentials)
            .transport(transport)
            .output_dir(dir)
            .build()
            .expect("pipeline builds")
    }

    fn read_snapshot(path: &Path) -> PolarsResult<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()
    }

    fn distinct_cities(df: &DataFrame) -> PolarsResult<BTreeSet<String>> {
        Ok(df
            .column("city")?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    #[tokio::test]
    async fn test_every_city_lands_in_both_snapshots() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let run = pipeline(&CITIES, healthy_transport(&CITIES), creds(), dir.path());

        let report = run.run(&window()).await?;

        let weather = read_snapshot(&dir.path().join(WEATHER_SNAPSHOT))?;
        let energy = read_snapshot(&dir.path().join(ENERGY_SNAPSHOT))?;
        assert_eq!(distinct_cities(&weather)?.len(), CITIES.len());
        assert_eq!(distinct_cities(&energy)?.len(), CITIES.len());
        assert_eq!(weather.height(), 9);
        assert_eq!(energy.height(), 9);
        assert_eq!(weather.get_column_names_str(), ["date", "city", "tmax", "tmin"]);
        assert_eq!(
            energy.get_column_names_str(),
            ["date", "city", "region", "region_name", "value", "value_units", "source"]
        );
        assert_eq!(report.failures(), 0);
        assert_eq!(report.weather_snapshot, Some(dir.path().join(WEATHER_SNAPSHOT)));
        assert_eq!(
            report.city("Chicago").map(|c| c.energy.clone()),
            Some(SourceOutcome::Rows {
                count: 3,
                source: Some(EnergySource::Primary)
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_city_without_results_is_skipped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let transport = MockTransport::new()
            .route(NOAA_URL, &[("stationid", CITIES[1].1)], [Reply::json(json!({}))])
            .route(NOAA_URL, &[], [Reply::json(noaa_body(0))])
            .route(EIA_URL, &[], [Reply::json(eia_body("ANY", 500.0))]);
        let run = pipeline(&CITIES, transport, creds(), dir.path());

        let report = run.run(&window()).await?;

        let weather = read_snapshot(&dir.path().join(WEATHER_SNAPSHOT))?;
        let cities = distinct_cities(&weather)?;
        assert_eq!(cities.len(), CITIES.len() - 1);
        assert!(!cities.contains("Chicago"));
        assert!(matches!(
            report.city("Chicago").map(|c| &c.weather),
            Some(SourceOutcome::Skipped(_))
        ));
        assert_eq!(report.failures(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_runs_write_identical_snapshots() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let run = pipeline(&CITIES, healthy_transport(&CITIES), creds(), dir.path());

        run.run(&window()).await?;
        let weather_first = std::fs::read(dir.path().join(WEATHER_SNAPSHOT))?;
        let energy_first = std::fs::read(dir.path().join(ENERGY_SNAPSHOT))?;

        run.run(&window()).await?;
        assert_eq!(std::fs::read(dir.path().join(WEATHER_SNAPSHOT))?, weather_first);
        assert_eq!(std::fs::read(dir.path().join(ENERGY_SNAPSHOT))?, energy_first);
        Ok(())
    }

    #[tokio::test]
    async fn test_unmapped_region_yields_no_energy_rows() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let cities = [("Boise", "GHCND:USW00024131", "IPCO")];
        let transport = MockTransport::new()
            .route(NOAA_URL, &[], [Reply::json(noaa_body(0))])
            .route(EIA_URL, &[], [Reply::json(json!({"response": {"total": 0, "data": []}}))]);
        let run = pipeline(&cities, transport, creds(), dir.path());

        let report = run.run(&window()).await?;

        assert_eq!(report.energy_rows(), 0);
        assert_eq!(report.energy_snapshot, None);
        assert!(!dir.path().join(ENERGY_SNAPSHOT).exists());
        assert_eq!(
            report.cities[0].energy,
            SourceOutcome::Skipped("No fallback series for IPCO".to_string())
        );
        assert_eq!(run.eia.series().series_id("IPCO"), None);
        assert_eq!(report.weather_rows(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_side_without_rows_leaves_previous_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let previous = "date,city,tmax,tmin\n2024-12-31,New York,40.0,30.0\n";
        std::fs::write(dir.path().join(WEATHER_SNAPSHOT), previous)?;
        let run = pipeline(
            &CITIES,
            healthy_transport(&CITIES),
            Credentials::new(None, Some("eia-key".into())),
            dir.path(),
        );

        let report = run.run(&window()).await?;

        assert_eq!(std::fs::read_to_string(dir.path().join(WEATHER_SNAPSHOT))?, previous);
        assert_eq!(report.weather_snapshot, None);
        assert_eq!(report.failures(), CITIES.len());
        assert_eq!(report.energy_rows(), 9);
        assert_eq!(run.noaa_calls(), 0);
        Ok(())
    }

    #[test]
    fn test_describe_includes_sources() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = crate::pipeline::error::SnapshotError::WriteIo(PathBuf::from("weather.csv"), inner);
        assert_eq!(
            describe(&err),
            "I/O error writing snapshot 'weather.csv': disk full"
        );
    }

    impl HistoricalPipeline<MockTransport> {
        fn noaa_calls(&self) -> usize {
            self.noaa.client().transport().calls_to(NOAA_URL)
        }
    }
}

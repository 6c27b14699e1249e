use chrono::Local;
use clap::Parser;
use dotenv::dotenv;
use grid_weather::{
    init_file_logger, AppConfig, Credentials, DateWindow, HistoricalPipeline, ReqwestTransport,
    DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILE,
};
use log::{error, warn};
use std::path::PathBuf;

const MAX_DAYS: i64 = 36_500;

/// Fetch daily weather (NOAA) and electricity demand (EIA) and write CSV snapshots.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of days back from today to fetch.
    #[arg(long, default_value_t = 90, value_parser = clap::value_parser!(u32).range(0..=MAX_DAYS))]
    days: u32,

    /// Pipeline configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory receiving weather.csv and energy.csv.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    let args = Args::parse();
    init_file_logger(&args.log_file)?;

    println!("Starting historical data fetch...");

    let config = AppConfig::load(&args.config).inspect_err(|e| error!("{}", e))?;
    let credentials = Credentials::from_env();
    for api in credentials.missing() {
        warn!(
            "{} not set, {} data will be skipped",
            api.credential_var(),
            api
        );
    }

    let pipeline = HistoricalPipeline::builder()
        .config(&config)
        .credentials(credentials)
        .transport(ReqwestTransport::new()?)
        .output_dir(args.data_dir)
        .build()?;

    let window = DateWindow::trailing_days(Local::now().date_naive(), args.days)
        .ok_or_else(|| format!("--days {} reaches past the earliest supported date", args.days))?;
    let report = pipeline
        .run(&window)
        .await
        .inspect_err(|e| error!("Pipeline run failed: {}", e))?;

    print!("{}", report);
    println!("Historical data saved to {}", pipeline.output_dir().display());
    Ok(())
}

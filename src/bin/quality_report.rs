use chrono::Local;
use clap::Parser;
use grid_weather::QualityReport;
use std::path::PathBuf;

/// Print missing values, outliers and freshness for the CSV snapshots.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory holding weather.csv and energy.csv.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let report = QualityReport::from_snapshots(&args.data_dir, Local::now().date_naive())?;
    print!("{}", report);
    Ok(())
}

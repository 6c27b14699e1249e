//! Summary of the persisted snapshots: gaps, outliers and freshness.

use crate::pipeline::snapshot::{ENERGY_SNAPSHOT, WEATHER_SNAPSHOT};
use crate::quality::clean::{
    detect_staleness, energy_outlier_expr, latest_date, merge_and_clean, temp_outlier_expr,
};
use crate::quality::error::QualityError;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Data older than this many days is reported as stale.
pub const DEFAULT_STALE_AFTER_DAYS: i64 = 1;

/// Latest date seen for one city or region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Freshness {
    pub key: String,
    pub latest: Option<NaiveDate>,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub city: String,
    /// Days with a weather row but no energy row, or the other way round.
    pub one_sided_days: usize,
}

/// Quality metrics over `weather.csv` and `energy.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityReport {
    pub today: NaiveDate,
    pub total_missing: usize,
    pub temperature_outliers: usize,
    pub energy_outliers: usize,
    /// Per city, from the weather snapshot.
    pub weather_freshness: Vec<Freshness>,
    /// Per region, from the energy snapshot.
    pub energy_freshness: Vec<Freshness>,
    pub coverage_gaps: Vec<CoverageGap>,
}

impl QualityReport {
    /// Reads both snapshots from `dir` and evaluates them against `today`.
    pub fn from_snapshots(dir: &Path, today: NaiveDate) -> Result<Self, QualityError> {
        let weather = read_snapshot(&dir.join(WEATHER_SNAPSHOT))?;
        let energy = read_snapshot(&dir.join(ENERGY_SNAPSHOT))?;
        Self::from_frames(&weather, &energy, today)
    }

    pub fn from_frames(
        weather: &DataFrame,
        energy: &DataFrame,
        today: NaiveDate,
    ) -> Result<Self, QualityError> {
        let total_missing = null_count(weather) + null_count(energy);
        let temperature_outliers = count_where(weather, temp_outlier_expr())?;
        let energy_outliers = count_where(energy, energy_outlier_expr())?;

        let weather_freshness = freshness_by(weather, "city", today)?;
        let energy_freshness = freshness_by(energy, "region", today)?;

        let mut cities = distinct(weather, "city")?;
        cities.extend(distinct(energy, "city")?);
        let mut coverage_gaps = Vec::with_capacity(cities.len());
        for city in cities {
            let merged = merge_and_clean(
                &city,
                &rows_for(weather, "city", &city)?,
                &rows_for(energy, "city", &city)?,
            )?;
            let one_sided = count_where(
                &merged,
                col("region")
                    .is_null()
                    .or(col("tmax").is_null().and(col("tmin").is_null())),
            )?;
            coverage_gaps.push(CoverageGap {
                city,
                one_sided_days: one_sided,
            });
        }

        Ok(Self {
            today,
            total_missing,
            temperature_outliers,
            energy_outliers,
            weather_freshness,
            energy_freshness,
            coverage_gaps,
        })
    }

    pub fn stale_count(&self) -> usize {
        self.weather_freshness
            .iter()
            .chain(&self.energy_freshness)
            .filter(|f| f.stale)
            .count()
    }
}

/// Measurement columns of both snapshots. A column with no values at all would otherwise
/// be inferred as text.
const NUMERIC_COLUMNS: [&str; 3] = ["tmax", "tmin", "value"];

fn read_snapshot(path: &Path) -> Result<DataFrame, QualityError> {
    if !path.is_file() {
        return Err(QualityError::MissingSnapshot(path.to_path_buf()));
    }
    let read_err = |e| QualityError::SnapshotRead(path.to_path_buf(), e);

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(read_err)?;

    let casts: Vec<Expr> = NUMERIC_COLUMNS
        .into_iter()
        .filter(|name| df.get_column_names_str().contains(name))
        .map(|name| col(name).cast(DataType::Float64))
        .collect();
    if casts.is_empty() {
        return Ok(df);
    }
    df.lazy().with_columns(casts).collect().map_err(read_err)
}

fn null_count(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|c| c.null_count()).sum()
}

fn count_where(df: &DataFrame, predicate: Expr) -> PolarsResult<usize> {
    Ok(df.clone().lazy().filter(predicate).collect()?.height())
}

fn rows_for(df: &DataFrame, column: &str, key: &str) -> PolarsResult<DataFrame> {
    df.clone().lazy().filter(col(column).eq(lit(key))).collect()
}

fn distinct(df: &DataFrame, column: &str) -> PolarsResult<BTreeSet<String>> {
    Ok(df
        .column(column)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect())
}

fn freshness_by(df: &DataFrame, column: &str, today: NaiveDate) -> PolarsResult<Vec<Freshness>> {
    distinct(df, column)?
        .into_iter()
        .map(|key| {
            let rows = rows_for(df, column, &key)?;
            Ok(Freshness {
                latest: latest_date(&rows)?,
                stale: detect_staleness(&rows, today, DEFAULT_STALE_AFTER_DAYS)?,
                key,
            })
        })
        .collect()
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Data quality report ({})", self.today)?;
        writeln!(f, "Total missing values: {}", self.total_missing)?;
        writeln!(f, "{} temperature outliers", self.temperature_outliers)?;
        writeln!(f, "{} energy outliers", self.energy_outliers)?;

        for (title, rows) in [
            ("Weather freshness", &self.weather_freshness),
            ("Energy freshness", &self.energy_freshness),
        ] {
            writeln!(f, "{}:", title)?;
            for row in rows {
                let latest = row
                    .latest
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let flag = if row.stale { " (stale)" } else { "" };
                writeln!(f, "  {}: {}{}", row.key, latest, flag)?;
            }
        }

        writeln!(f, "Days present on one side only:")?;
        for gap in &self.coverage_gaps {
            writeln!(f, "  {}: {}", gap.city, gap.one_sided_days)?;
        }
        Ok(())
    }
}

//! Turns NOAA's long `{date, datatype, value}` rows into one wide row per day.

use crate::types::date_window::DateWindow;
use chrono::NaiveDate;
use log::warn;
use polars::prelude::*;
use serde::Deserialize;

pub const TMAX: &str = "TMAX";
pub const TMIN: &str = "TMIN";

/// Column order of the weather snapshot.
pub const WEATHER_COLUMNS: [&str; 4] = ["date", "city", "tmax", "tmin"];

/// One GHCND observation as returned in `results`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NoaaObservation {
    /// `YYYY-MM-DDTHH:MM:SS`
    pub date: String,
    pub datatype: String,
    /// Tenths of a degree Celsius for TMAX/TMIN.
    pub value: f64,
}

impl NoaaObservation {
    pub fn new(date: impl Into<String>, datatype: impl Into<String>, value: f64) -> Self {
        Self {
            date: date.into(),
            datatype: datatype.into(),
            value,
        }
    }
}

/// `°F = tenths * 0.1 * 9/5 + 32`, arranged so whole-degree inputs stay exact.
///
/// ```
/// use grid_weather::tenths_celsius_to_fahrenheit;
///
/// assert_eq!(tenths_celsius_to_fahrenheit(300.0), 86.0);
/// assert_eq!(tenths_celsius_to_fahrenheit(0.0), 32.0);
/// ```
pub fn tenths_celsius_to_fahrenheit(tenths: f64) -> f64 {
    tenths * 9.0 / 50.0 + 32.0
}

fn fahrenheit_expr(tenths: Expr) -> Expr {
    tenths * lit(9.0) / lit(50.0) + lit(32.0)
}

pub(crate) fn parse_observation_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Pivots observations for one city into `date, city, tmax, tmin` in °F, sorted by date.
///
/// Duplicate readings for a day are averaged. Rows outside `window`, with an unparsable
/// date, or with a datatype other than TMAX/TMIN are dropped. A day that only has one
/// of the two datatypes keeps a null for the other.
pub fn weather_frame(
    observations: &[NoaaObservation],
    city: &str,
    window: &DateWindow,
) -> PolarsResult<DataFrame> {
    let mut dates = Vec::with_capacity(observations.len());
    let mut datatypes = Vec::with_capacity(observations.len());
    let mut values = Vec::with_capacity(observations.len());
    let mut unparsable = 0usize;

    for obs in observations {
        if obs.datatype != TMAX && obs.datatype != TMIN {
            continue;
        }
        let Some(date) = parse_observation_date(&obs.date) else {
            unparsable += 1;
            continue;
        };
        if !window.contains(date) {
            continue;
        }
        dates.push(date);
        datatypes.push(obs.datatype.as_str());
        values.push(obs.value);
    }

    if unparsable > 0 {
        warn!("Dropped {} weather rows with unparsable dates for {}", unparsable, city);
    }
    if dates.is_empty() {
        return Ok(DataFrame::empty());
    }

    let long = df!(
        "date" => dates,
        "datatype" => datatypes,
        "value" => values,
    )?;

    long.lazy()
        .group_by_stable([col("date")])
        .agg([
            col("value")
                .filter(col("datatype").eq(lit(TMAX)))
                .mean()
                .alias("tmax"),
            col("value")
                .filter(col("datatype").eq(lit(TMIN)))
                .mean()
                .alias("tmin"),
        ])
        .with_column(lit(city).alias("city"))
        .select([
            col("date"),
            col("city"),
            fahrenheit_expr(col("tmax")).alias("tmax"),
            fahrenheit_expr(col("tmin")).alias("tmin"),
        ])
        .sort_by_exprs([col("date")], SortMultipleOptions::default())
        .collect()
}

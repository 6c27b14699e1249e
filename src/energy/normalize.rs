//! Brings both EIA response shapes into the energy snapshot schema.
//!
//! Both paths end in one row per day: the v2 API can report a day several times
//! (once per timezone), the legacy series reports every hour. Either way the day's
//! rows are averaged.

use crate::types::data_source::EnergySource;
use crate::types::date_window::DateWindow;
use chrono::NaiveDate;
use log::warn;
use polars::prelude::*;
use serde::{Deserialize, Deserializer};

/// Column order of the energy snapshot.
pub const ENERGY_COLUMNS: [&str; 7] = [
    "date",
    "city",
    "region",
    "region_name",
    "value",
    "value_units",
    "source",
];

const DEMAND_TYPE: &str = "D";

/// One row of the v2 `response.data` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DemandRecord {
    /// `YYYY-MM-DD`
    pub period: String,
    #[serde(default)]
    pub respondent: Option<String>,
    #[serde(default, rename = "respondent-name")]
    pub respondent_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub value: Option<f64>,
    #[serde(default, rename = "value-units")]
    pub value_units: Option<String>,
}

/// The v2 API sends numbers as strings on some routes.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(v)) => Some(v),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Day of a legacy series timestamp. `YYYYMMDDHH` is the hourly form; a bare `YYYYMMDD`
/// is accepted too.
///
/// ```
/// use grid_weather::parse_series_timestamp;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_series_timestamp("2025010123"), NaiveDate::from_ymd_opt(2025, 1, 1));
/// assert_eq!(parse_series_timestamp("2025010124"), None);
/// ```
pub fn parse_series_timestamp(raw: &str) -> Option<NaiveDate> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match raw.len() {
        8 => NaiveDate::parse_from_str(raw, "%Y%m%d").ok(),
        10 => {
            let hour: u32 = raw[8..].parse().ok()?;
            if hour > 23 {
                return None;
            }
            NaiveDate::parse_from_str(&raw[..8], "%Y%m%d").ok()
        }
        _ => None,
    }
}

fn parse_period(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// Normalizes v2 daily demand rows for one city. Non-demand types are ignored.
pub fn primary_frame(
    records: &[DemandRecord],
    city: &str,
    region: &str,
    window: &DateWindow,
) -> PolarsResult<DataFrame> {
    let mut dates = Vec::with_capacity(records.len());
    let mut values = Vec::with_capacity(records.len());
    let mut names = Vec::with_capacity(records.len());
    let mut units = Vec::with_capacity(records.len());

    for record in records {
        if record.kind.as_deref().is_some_and(|k| k != DEMAND_TYPE) {
            continue;
        }
        let Some(date) = parse_period(&record.period) else {
            continue;
        };
        if !window.contains(date) {
            continue;
        }
        dates.push(date);
        values.push(record.value);
        names.push(record.respondent_name.clone());
        units.push(record.value_units.clone());
    }

    if dates.is_empty() {
        return Ok(DataFrame::empty());
    }

    let rows = df!(
        "date" => dates,
        "value" => values,
        "region_name" => names,
        "value_units" => units,
    )?;

    daily_means(
        rows.lazy(),
        [col("region_name").first(), col("value_units").first()],
        [],
        city,
        region,
        EnergySource::Primary,
    )
}

/// Resamples an hourly legacy series to daily means for one city.
pub fn fallback_frame(
    points: &[(String, Option<f64>)],
    units: &str,
    city: &str,
    region: &str,
    window: &DateWindow,
) -> PolarsResult<DataFrame> {
    let mut dates = Vec::with_capacity(points.len() / 24 + 1);
    let mut values = Vec::with_capacity(points.len());
    let mut unparsable = 0usize;

    for (timestamp, value) in points {
        let Some(date) = parse_series_timestamp(timestamp) else {
            unparsable += 1;
            continue;
        };
        if window.contains(date) {
            dates.push(date);
            values.push(*value);
        }
    }

    if unparsable > 0 {
        warn!("Dropped {} fallback points with unparsable timestamps for {}", unparsable, region);
    }
    if dates.is_empty() {
        return Ok(DataFrame::empty());
    }

    let rows = df!(
        "date" => dates,
        "value" => values,
    )?;

    daily_means(
        rows.lazy(),
        [],
        [
            lit(NULL).cast(DataType::String).alias("region_name"),
            lit(units).alias("value_units"),
        ],
        city,
        region,
        EnergySource::Fallback,
    )
}

/// Groups rows by day with the mean `value`, then adds the constant columns.
fn daily_means<const A: usize, const C: usize>(
    rows: LazyFrame,
    per_day: [Expr; A],
    constants: [Expr; C],
    city: &str,
    region: &str,
    source: EnergySource,
) -> PolarsResult<DataFrame> {
    let mut aggs = vec![col("value").mean()];
    aggs.extend(per_day);

    let mut columns = vec![
        lit(city).alias("city"),
        lit(region).alias("region"),
        lit(source.column_value()).alias("source"),
    ];
    columns.extend(constants);

    rows.group_by_stable([col("date")])
        .agg(aggs)
        .with_columns(columns)
        .select(ENERGY_COLUMNS.map(col))
        .sort_by_exprs([col("date")], SortMultipleOptions::default())
        .collect()
}

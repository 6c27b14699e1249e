//! Per-city merge of the two snapshot sides, with quality flags.

use chrono::NaiveDate;
use polars::prelude::*;

/// Daily highs above this are treated as sensor or unit errors (°F).
pub const TEMP_HIGH_LIMIT: f64 = 130.0;
/// Daily lows below this are treated as sensor or unit errors (°F).
pub const TEMP_LOW_LIMIT: f64 = -50.0;

const WEATHER_VALUES: [&str; 2] = ["tmax", "tmin"];
const ENERGY_VALUES: [&str; 5] = ["region", "region_name", "value", "value_units", "source"];

pub(crate) fn temp_outlier_expr() -> Expr {
    col("tmax")
        .gt(lit(TEMP_HIGH_LIMIT))
        .or(col("tmin").lt(lit(TEMP_LOW_LIMIT)))
        .fill_null(lit(false))
}

pub(crate) fn energy_outlier_expr() -> Expr {
    col("value").lt(lit(0.0)).fill_null(lit(false))
}

/// Joins one city's weather and energy rows on `date` (full outer join) and flags them.
///
/// Both frames must carry the snapshot columns; their `city` columns are replaced by
/// `city`. Added columns:
///
/// * `missing`: number of null values in the row,
/// * `temp_outlier`: `tmax > 130` or `tmin < -50`,
/// * `energy_outlier`: `value < 0`.
pub fn merge_and_clean(
    city: &str,
    weather: &DataFrame,
    energy: &DataFrame,
) -> PolarsResult<DataFrame> {
    let weather = weather
        .clone()
        .lazy()
        .select([col("date"), col("tmax"), col("tmin")]);
    let energy = energy.clone().lazy().select(
        std::iter::once(col("date"))
            .chain(ENERGY_VALUES.iter().map(|c| col(*c)))
            .collect::<Vec<_>>(),
    );

    let missing = WEATHER_VALUES
        .iter()
        .chain(ENERGY_VALUES.iter())
        .map(|c| col(*c).is_null().cast(DataType::UInt32))
        .reduce(|acc, e| acc + e)
        .unwrap_or_else(|| lit(0u32));

    weather
        .join(
            energy,
            [col("date")],
            [col("date")],
            JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .with_column(lit(city).alias("city"))
        .with_columns([
            missing.alias("missing"),
            temp_outlier_expr().alias("temp_outlier"),
            energy_outlier_expr().alias("energy_outlier"),
        ])
        .select([
            col("date"),
            col("city"),
            col("tmax"),
            col("tmin"),
            col("region"),
            col("region_name"),
            col("value"),
            col("value_units"),
            col("source"),
            col("missing"),
            col("temp_outlier"),
            col("energy_outlier"),
        ])
        .sort_by_exprs([col("date")], SortMultipleOptions::default())
        .collect()
}

/// Most recent non-null `date` in a frame.
pub fn latest_date(frame: &DataFrame) -> PolarsResult<Option<NaiveDate>> {
    Ok(frame.column("date")?.date()?.as_date_iter().flatten().max())
}

/// True when the latest `date` in `frame` is more than `threshold_days` before `today`.
/// A frame without any date is always stale.
pub fn detect_staleness(
    frame: &DataFrame,
    today: NaiveDate,
    threshold_days: i64,
) -> PolarsResult<bool> {
    Ok(match latest_date(frame)? {
        Some(latest) => (today - latest).num_days() > threshold_days,
        None => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn weather() -> DataFrame {
        df!(
            "date" => [day(1), day(2), day(3)],
            "city" => ["Phoenix", "Phoenix", "Phoenix"],
            "tmax" => [Some(70.0), Some(140.0), None],
            "tmin" => [Some(40.0), Some(45.0), Some(-60.0)],
        )
        .unwrap()
    }

    fn energy() -> DataFrame {
        df!(
            "date" => [day(2), day(3), day(4)],
            "city" => ["Phoenix", "Phoenix", "Phoenix"],
            "region" => ["AZPS", "AZPS", "AZPS"],
            "region_name" => [Some("Arizona Public Service"), None, None],
            "value" => [8000.0, -1.0, 7000.0],
            "value_units" => ["megawatthours", "megawatthours", "megawatthours"],
            "source" => ["primary", "fallback", "fallback"],
        )
        .unwrap()
    }

    #[test]
    fn test_merge_flags_rows() -> Result<(), Box<dyn std::error::Error>> {
        let merged = merge_and_clean("Phoenix", &weather(), &energy())?;

        assert_eq!(merged.height(), 4);
        let dates: Vec<Option<NaiveDate>> = merged.column("date")?.date()?.as_date_iter().collect();
        assert_eq!(dates, vec![Some(day(1)), Some(day(2)), Some(day(3)), Some(day(4))]);

        let missing: Vec<Option<u32>> = merged.column("missing")?.u32()?.into_iter().collect();
        assert_eq!(missing, vec![Some(5), Some(0), Some(2), Some(3)]);

        let temp: Vec<Option<bool>> = merged.column("temp_outlier")?.bool()?.into_iter().collect();
        assert_eq!(temp, vec![Some(false), Some(true), Some(true), Some(false)]);

        let energy: Vec<Option<bool>> = merged.column("energy_outlier")?.bool()?.into_iter().collect();
        assert_eq!(energy, vec![Some(false), Some(false), Some(true), Some(false)]);

        assert_eq!(merged.column("city")?.str()?.get(3), Some("Phoenix"));
        Ok(())
    }

    #[test]
    fn test_staleness_threshold() -> Result<(), Box<dyn std::error::Error>> {
        let frame = weather();
        assert!(!detect_staleness(&frame, day(4), 1)?);
        assert!(detect_staleness(&frame, day(5), 1)?);
        assert!(!detect_staleness(&frame, day(5), 2)?);
        Ok(())
    }

    #[test]
    fn test_frame_without_dates_is_stale() -> Result<(), Box<dyn std::error::Error>> {
        let frame = weather().head(Some(0));
        assert_eq!(latest_date(&frame)?, None);
        assert!(detect_staleness(&frame, day(1), 1)?);
        Ok(())
    }
}

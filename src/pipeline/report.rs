//! What a pipeline run did, city by city.

use crate::types::data_source::EnergySource;
use crate::types::date_window::DateWindow;
use std::fmt;
use std::path::PathBuf;

/// Outcome of one city/source pair.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutcome {
    /// Rows were produced. `source` is set for energy only.
    Rows {
        count: usize,
        source: Option<EnergySource>,
    },
    /// The source answered but had nothing inside the window.
    Empty,
    /// Expected gaps: a response without data, an unmapped fallback region.
    Skipped(String),
    /// Missing credentials, exhausted retries, broken responses.
    Failed(String),
}

impl SourceOutcome {
    pub fn rows(&self) -> usize {
        match self {
            SourceOutcome::Rows { count, .. } => *count,
            _ => 0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceOutcome::Failed(_))
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::Rows {
                count,
                source: Some(source),
            } => write!(f, "{} rows ({})", count, source),
            SourceOutcome::Rows { count, source: None } => write!(f, "{} rows", count),
            SourceOutcome::Empty => write!(f, "no rows"),
            SourceOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            SourceOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CityReport {
    pub city: String,
    pub weather: SourceOutcome,
    pub energy: SourceOutcome,
}

/// Returned by [`HistoricalPipeline::run`](crate::HistoricalPipeline::run).
///
/// A snapshot path is `None` when its side produced no rows and the previous file,
/// if any, was left in place.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub window: DateWindow,
    pub cities: Vec<CityReport>,
    pub weather_snapshot: Option<PathBuf>,
    pub energy_snapshot: Option<PathBuf>,
}

impl RunReport {
    pub fn weather_rows(&self) -> usize {
        self.cities.iter().map(|c| c.weather.rows()).sum()
    }

    pub fn energy_rows(&self) -> usize {
        self.cities.iter().map(|c| c.energy.rows()).sum()
    }

    pub fn failures(&self) -> usize {
        self.cities
            .iter()
            .map(|c| usize::from(c.weather.is_failure()) + usize::from(c.energy.is_failure()))
            .sum()
    }

    pub fn city(&self, name: &str) -> Option<&CityReport> {
        self.cities.iter().find(|c| c.city == name)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Window {}: {} weather rows, {} energy rows, {} failures",
            self.window,
            self.weather_rows(),
            self.energy_rows(),
            self.failures()
        )?;
        for city in &self.cities {
            writeln!(
                f,
                "  {}: weather {}, energy {}",
                city.city, city.weather, city.energy
            )?;
        }
        Ok(())
    }
}

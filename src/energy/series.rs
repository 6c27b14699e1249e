//! Region code to legacy EIA series id lookup for the fallback path.

use std::collections::BTreeMap;

const BUILT_IN_SERIES: [(&str, &str); 5] = [
    ("NYIS", "EBA.NYIS-ALL.D.H"),
    ("PJM", "EBA.PJM-ALL.D.H"),
    ("ERCO", "EBA.ERCO.D.H"),
    ("AZPS", "EBA.AZPS.D.H"),
    ("SCL", "EBA.SCL.D.H"),
];

/// Hourly demand series known for each balancing authority.
///
/// # Examples
///
/// ```
/// use grid_weather::SeriesTable;
/// use std::collections::BTreeMap;
///
/// let table = SeriesTable::built_in();
/// assert_eq!(table.series_id("ERCO"), Some("EBA.ERCO.D.H"));
/// assert_eq!(table.series_id("MISO"), None);
///
/// let extra = BTreeMap::from([("MISO".to_string(), "EBA.MISO-ALL.D.H".to_string())]);
/// assert_eq!(SeriesTable::with_overrides(&extra).series_id("MISO"), Some("EBA.MISO-ALL.D.H"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesTable {
    entries: BTreeMap<String, String>,
}

impl SeriesTable {
    pub fn built_in() -> Self {
        Self {
            entries: BUILT_IN_SERIES
                .iter()
                .map(|(region, series)| (region.to_string(), series.to_string()))
                .collect(),
        }
    }

    /// The built-in table with `overrides` added on top; overrides win on conflicts.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut table = Self::built_in();
        table.entries.extend(
            overrides
                .iter()
                .map(|(region, series)| (region.clone(), series.clone())),
        );
        table
    }

    pub fn series_id(&self, region_code: &str) -> Option<&str> {
        self.entries.get(region_code).map(String::as_str)
    }
}

impl Default for SeriesTable {
    fn default() -> Self {
        Self::built_in()
    }
}

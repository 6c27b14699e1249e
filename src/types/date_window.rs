//! The inclusive date range a pipeline run requests from every source.

use chrono::{Duration, NaiveDate};
use std::fmt;

const API_DATE_FORMAT: &str = "%Y-%m-%d";

/// An inclusive `[start, end]` range of calendar days.
///
/// The pipeline never reads the clock itself; callers build the window, usually with
/// [`DateWindow::trailing_days`] at the outermost entry point.
///
/// # Examples
///
/// ```
/// use grid_weather::DateWindow;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
/// let window = DateWindow::trailing_days(today, 90).unwrap();
/// assert_eq!(window.start(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
/// assert!(window.contains(today));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, returning `None` when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The window `[end - days, end]`, or `None` when the start falls outside chrono's
    /// date range.
    pub fn trailing_days(end: NaiveDate, days: u32) -> Option<Self> {
        let start = end.checked_sub_signed(Duration::days(i64::from(days)))?;
        Some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Start date as the `YYYY-MM-DD` string both APIs expect.
    pub fn start_param(&self) -> String {
        self.start.format(API_DATE_FORMAT).to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format(API_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start_param(), self.end_param())
    }
}

//! # Reporting Date Window
//!
//! The API filters volunteer history by `startDate` (inclusive) and `endDate`
//! (exclusive). Monthly reports always run from the start of the year up to the
//! first day of the month following the report month.

use chrono::{Datelike, Duration, Local, NaiveDate};
use log::{info, warn};

use crate::error::{Result, VolunteerError};

/// # Date Window
///
/// A half-open calendar range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// First day included in the extraction.
    pub start: NaiveDate,
    /// First day no longer included (the API's `endDate`).
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Builds the window for a monthly report.
    ///
    /// `end` is the first day of the month after `report_month`. When `start` is
    /// `None` the window opens on January 1st of the report year.
    pub fn for_report_month(report_month: NaiveDate, start: Option<NaiveDate>) -> Result<Self> {
        let end = first_of_next_month(report_month)?;
        let start = match start {
            Some(s) => s,
            None => NaiveDate::from_ymd_opt(report_month.year(), 1, 1).ok_or_else(|| {
                VolunteerError::Config(format!("invalid report year {}", report_month.year()))
            })?,
        };
        Ok(Self { start, end })
    }

    /// Parses a `YYYY-MM` (or full `YYYY-MM-DD`) report month.
    pub fn parse_month(value: &str) -> Result<NaiveDate> {
        let trimmed = value.trim();
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"))
            .map(|d| d.with_day(1).unwrap_or(d))
            .map_err(|e| VolunteerError::Config(format!("invalid month '{value}': {e}")))
    }

    /// First day of the month before the one containing `today`; the default
    /// report month.
    pub fn previous_month(today: NaiveDate) -> NaiveDate {
        let first = today.with_day(1).unwrap_or(today);
        let last_of_previous = first - Duration::days(1);
        last_of_previous.with_day(1).unwrap_or(last_of_previous)
    }

    /// The last day actually covered by the window.
    pub fn last_day(&self) -> NaiveDate {
        self.end - Duration::days(1)
    }

    /// Checks that the range is logical.
    ///
    /// A start on or after the end is an error; an end in the future only
    /// produces a warning because the API simply returns nothing for those days.
    pub fn validate(&self) -> Result<()> {
        self.validate_against(Local::now().date_naive())
    }

    pub(crate) fn validate_against(&self, today: NaiveDate) -> Result<()> {
        if self.start >= self.end {
            log::error!(
                "Invalid date range: start_date ({}) must be before end_date ({})",
                self.start,
                self.end
            );
            return Err(VolunteerError::DateRange {
                start: self.start.to_string(),
                end: self.end.to_string(),
            });
        }
        if self.end > today {
            warn!("End date ({}) is in the future", self.end);
        }
        info!("Date range validated: {} to {}", self.start, self.end);
        Ok(())
    }
}

fn first_of_next_month(date: NaiveDate) -> Result<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| VolunteerError::Config(format!("no month follows {date}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn august_report_runs_from_january_to_september_first() {
        let window = DateWindow::for_report_month(ymd(2025, 8, 1), None).unwrap();
        assert_eq!(window.start, ymd(2025, 1, 1));
        assert_eq!(window.end, ymd(2025, 9, 1));
        assert_eq!(window.last_day(), ymd(2025, 8, 31));
    }

    #[test]
    fn december_report_rolls_over_the_year() {
        let window = DateWindow::for_report_month(ymd(2024, 12, 15), None).unwrap();
        assert_eq!(window.start, ymd(2024, 1, 1));
        assert_eq!(window.end, ymd(2025, 1, 1));
    }

    #[test]
    fn month_parsing_accepts_both_forms() {
        assert_eq!(DateWindow::parse_month("2025-08").unwrap(), ymd(2025, 8, 1));
        assert_eq!(DateWindow::parse_month("2025-08-19").unwrap(), ymd(2025, 8, 1));
        assert!(DateWindow::parse_month("August").is_err());
    }

    #[test]
    fn previous_month_crosses_year_boundary() {
        assert_eq!(DateWindow::previous_month(ymd(2025, 9, 2)), ymd(2025, 8, 1));
        assert_eq!(DateWindow::previous_month(ymd(2026, 1, 31)), ymd(2025, 12, 1));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let window = DateWindow::new(ymd(2025, 9, 1), ymd(2025, 1, 1));
        assert!(matches!(
            window.validate_against(ymd(2025, 10, 1)),
            Err(VolunteerError::DateRange { .. })
        ));
    }

    #[test]
    fn future_end_only_warns() {
        let window = DateWindow::new(ymd(2025, 1, 1), ymd(2025, 9, 1));
        assert!(window.validate_against(ymd(2025, 3, 1)).is_ok());
    }
}

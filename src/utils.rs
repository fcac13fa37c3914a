use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};

use crate::error::ConfigError;
use crate::models::{DateRangeConfig, Window};

/// Timestamp layout written to QuestDB: second precision, no zone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Calendar-month windows between the configured boundaries.
///
/// The first window starts on the configured start date; each following one
/// starts one calendar month later. Every window ends on the last day of its
/// start month. Iteration stops before `(end_year + 1, end_month, end_day)`.
#[derive(Debug, Clone)]
pub struct MonthWindows {
    current: Option<NaiveDate>,
    end: NaiveDate,
}

impl MonthWindows {
    /// Fails if the start date or the end sentinel is not a real calendar date.
    pub fn new(range: DateRangeConfig) -> Result<Self, ConfigError> {
        let start = calendar_date(range.start_year, range.start_month, range.start_day)?;
        let end_year = range.end_year.checked_add(1).ok_or(ConfigError::InvalidDate {
            year: range.end_year,
            month: range.end_month,
            day: range.end_day,
        })?;
        let end = calendar_date(end_year, range.end_month, range.end_day)?;
        Ok(Self {
            current: Some(start),
            end,
        })
    }
}

impl Iterator for MonthWindows {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let start = self.current.filter(|d| *d < self.end)?;
        let end_date = last_day_of_month(start)?;
        // Jan 31 + 1 month lands on Feb 28; the clamped day carries forward.
        self.current = start.checked_add_months(Months::new(1));
        Some(Window::new(start, end_date))
    }
}

fn calendar_date(year: i32, month: u32, day: u32) -> Result<NaiveDate, ConfigError> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ConfigError::InvalidDate { year, month, day })
}

/// Last calendar day of the month containing `date`
pub fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Lenient timestamp parsing; `None` for anything unrecognised.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_timestamp(time: &NaiveDateTime) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

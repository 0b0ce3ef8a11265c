//! Date parsing and inclusive date ranges for chronology facets.
//!
//! All instants are UTC milliseconds since the Unix epoch. Values that cannot
//! be parsed fail closed: they never satisfy an active range filter and are
//! left out of extent computations.

use crate::aggregation::Bucket;
use crate::models::FieldValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Numbers with an integral magnitude below this are read as years
const YEAR_NUMBER_LIMIT: f64 = 10_000.0;

/// Inclusive millisecond range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    pub start: i64,
    pub end: i64,
}

impl DateRange {
    /// Returns `None` when `start > end`
    pub fn new(start: i64, end: i64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, instant: i64) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Parse "START..END" where each side is anything `parse_date` accepts
    pub fn parse(s: &str) -> Option<Self> {
        let (start, end) = s.split_once("..")?;
        Self::new(parse_date(start)?, parse_date(end)?)
    }
}

/// Parse a date string into UTC milliseconds
///
/// Accepts a bare year ("1960", "-0044"), "YYYY-MM", "YYYY-MM-DD",
/// naive date-times, RFC 3339, and long integers as millisecond timestamps.
pub fn parse_date(value: &str) -> Option<i64> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }

    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        let n: i64 = s.parse().ok()?;
        return if digits.len() <= 4 {
            year_start(i32::try_from(n).ok()?)
        } else {
            Some(n)
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date_start(date);
    }

    // Year-month: pin to the first day
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return date_start(date);
    }

    None
}

/// Parse a field value; any list element may carry the date
pub fn parse_field_dates(value: &FieldValue) -> Vec<i64> {
    match value {
        FieldValue::Number(n) => parse_number(*n).into_iter().collect(),
        FieldValue::Text(s) => parse_date(s).into_iter().collect(),
        FieldValue::List(values) => values.iter().filter_map(|v| parse_date(v)).collect(),
    }
}

fn parse_number(n: f64) -> Option<i64> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < YEAR_NUMBER_LIMIT {
        year_start(n as i32)
    } else {
        Some(n as i64)
    }
}

fn year_start(year: i32) -> Option<i64> {
    NaiveDate::from_ymd_opt(year, 1, 1).and_then(date_start)
}

fn date_start(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Render an instant as a calendar date, or the raw milliseconds when out of range
pub fn format_instant(instant: i64) -> String {
    DateTime::from_timestamp_millis(instant)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| instant.to_string())
}

/// Smallest and largest parseable bucket key, the domain of a range control
pub fn chronology_extent(buckets: &[Bucket]) -> Option<DateRange> {
    let mut dates = buckets.iter().filter_map(|b| parse_date(&b.key));
    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    DateRange::new(start, end)
}

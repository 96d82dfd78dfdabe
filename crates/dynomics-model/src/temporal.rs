//! Timestamp parsing and calendar projection for temporal columns.
//!
//! Numbers, and text that parses as a number, are Unix epoch seconds in UTC.
//! Other text is accepted in the ISO 8601 extended forms:
//!
//! - RFC 3339: `2023-04-01T12:30:00Z`, `2023-04-01T12:30:00+02:00`
//! - Date and time: `2023-04-01T12:30:00`, `2023-04-01 12:30:00.250`
//! - Date only: `2023-04-01` (midnight UTC)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};

use crate::value::RawValue;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar granularity a timestamp can be projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Year,
    Quarter,
    Month,
    /// ISO 8601 week number.
    Week,
    Day,
    /// Monday is 0, Sunday is 6.
    DayOfWeek,
    /// 1-based day within the year.
    DayOfYear,
    Hour,
    Minute,
    Second,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Year => "year",
            TimeUnit::Quarter => "quarter",
            TimeUnit::Month => "month",
            TimeUnit::Week => "week",
            TimeUnit::Day => "day",
            TimeUnit::DayOfWeek => "dayofweek",
            TimeUnit::DayOfYear => "dayofyear",
            TimeUnit::Hour => "hour",
            TimeUnit::Minute => "minute",
            TimeUnit::Second => "second",
        }
    }

    /// Extracts this unit's field from a timestamp.
    pub fn project(&self, timestamp: &DateTime<Utc>) -> i64 {
        match self {
            TimeUnit::Year => i64::from(timestamp.year()),
            TimeUnit::Quarter => i64::from((timestamp.month() - 1) / 3 + 1),
            TimeUnit::Month => i64::from(timestamp.month()),
            TimeUnit::Week => i64::from(timestamp.iso_week().week()),
            TimeUnit::Day => i64::from(timestamp.day()),
            TimeUnit::DayOfWeek => i64::from(timestamp.weekday().num_days_from_monday()),
            TimeUnit::DayOfYear => i64::from(timestamp.ordinal()),
            TimeUnit::Hour => i64::from(timestamp.hour()),
            TimeUnit::Minute => i64::from(timestamp.minute()),
            TimeUnit::Second => i64::from(timestamp.second()),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    /// Accepts the unit names case-insensitively, with or without `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "");
        match normalized.as_str() {
            "year" => Ok(TimeUnit::Year),
            "quarter" => Ok(TimeUnit::Quarter),
            "month" => Ok(TimeUnit::Month),
            "week" => Ok(TimeUnit::Week),
            "day" => Ok(TimeUnit::Day),
            "dayofweek" | "weekday" => Ok(TimeUnit::DayOfWeek),
            "dayofyear" => Ok(TimeUnit::DayOfYear),
            "hour" => Ok(TimeUnit::Hour),
            "minute" => Ok(TimeUnit::Minute),
            "second" => Ok(TimeUnit::Second),
            _ => Err(format!("Unknown time unit: {s}")),
        }
    }
}

/// Converts Unix epoch seconds to a UTC timestamp.
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

/// Parses a raw value into a UTC timestamp.
pub fn parse_timestamp(value: &RawValue) -> Option<DateTime<Utc>> {
    if let Some(seconds) = value.to_f64() {
        return from_epoch_seconds(seconds);
    }
    parse_datetime_text(value.as_text()?)
}

fn parse_datetime_text(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

//! Loosely-typed date input for query ranges.
//!
//! Naive dates and datetimes are read as UTC, the same zone the chart
//! endpoint uses for `period1`/`period2`.

use super::error::QueryError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Anything that names a point in time for a query range.
#[derive(Debug, Clone, PartialEq)]
pub enum DateLike {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Instant(DateTime<Utc>),
    EpochSeconds(i64),
    Text(String),
}

impl DateLike {
    /// Resolve to a UTC instant.
    pub fn to_utc(&self) -> Result<DateTime<Utc>, QueryError> {
        match self {
            DateLike::Date(d) => Ok(d.and_time(NaiveTime::MIN).and_utc()),
            DateLike::DateTime(dt) => Ok(dt.and_utc()),
            DateLike::Instant(dt) => Ok(*dt),
            DateLike::EpochSeconds(secs) => DateTime::from_timestamp(*secs, 0)
                .ok_or_else(|| QueryError::OutOfRange(format!("{secs} seconds"))),
            DateLike::Text(s) => parse_text(s),
        }
    }

    /// Whole seconds since the epoch; any sub-second part is truncated.
    pub fn epoch_seconds(&self) -> Result<i64, QueryError> {
        match self {
            DateLike::EpochSeconds(secs) => Ok(*secs),
            other => Ok(truncated_seconds(other.to_utc()?)),
        }
    }
}

/// Seconds since the epoch, truncated toward zero.
pub(crate) fn truncated_seconds(instant: DateTime<Utc>) -> i64 {
    let secs = instant.timestamp();
    // chrono floors negative instants; pull them back toward zero
    if secs < 0 && instant.timestamp_subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn parse_text(input: &str) -> Result<DateTime<Utc>, QueryError> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc());
        }
    }

    Err(QueryError::InvalidDate {
        input: input.to_string(),
    })
}

impl From<NaiveDate> for DateLike {
    fn from(d: NaiveDate) -> Self {
        DateLike::Date(d)
    }
}

impl From<NaiveDateTime> for DateLike {
    fn from(dt: NaiveDateTime) -> Self {
        DateLike::DateTime(dt)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateLike {
    fn from(dt: DateTime<Tz>) -> Self {
        DateLike::Instant(dt.with_timezone(&Utc))
    }
}

impl From<i64> for DateLike {
    fn from(secs: i64) -> Self {
        DateLike::EpochSeconds(secs)
    }
}

impl From<&str> for DateLike {
    fn from(s: &str) -> Self {
        DateLike::Text(s.to_string())
    }
}

impl From<String> for DateLike {
    fn from(s: String) -> Self {
        DateLike::Text(s)
    }
}

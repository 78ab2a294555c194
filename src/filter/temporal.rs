//! Temporal literals for `TIMESTAMP(...)` and `DATE(...)`

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde_json::Value;

/// A point in time a filter can order against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instant {
    /// RFC 3339 timestamp, normalized to UTC
    Timestamp(DateTime<Utc>),
    /// Calendar date (`YYYY-MM-DD`)
    Date(NaiveDate),
}

impl Instant {
    pub fn timestamp(text: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(text).map(|t| Self::Timestamp(t.with_timezone(&Utc)))
    }

    pub fn date(text: &str) -> Result<Self, chrono::ParseError> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").map(Self::Date)
    }

    /// Read an input string as an instant, timestamp before date
    pub fn coerce(value: &Value) -> Option<Self> {
        let text = value.as_str()?;
        Self::timestamp(text).or_else(|_| Self::date(text)).ok()
    }

    /// Dates order as the start of their UTC day against timestamps
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            _ => self.start().cmp(&other.start()),
        }
    }

    fn start(&self) -> DateTime<Utc> {
        match self {
            Self::Timestamp(t) => *t,
            Self::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(t) => {
                write!(f, "TIMESTAMP('{}')", t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Date(d) => write!(f, "DATE('{}')", d.format("%Y-%m-%d")),
        }
    }
}

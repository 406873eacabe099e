//! Time buckets for report series
//!
//! A bucket label is chosen so that sorting labels as strings sorts them
//! chronologically: `2025-01-05`, `2025-W01`, `2025-01`.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity of a time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BucketSize {
    /// Calendar day (`YYYY-MM-DD`)
    #[default]
    Day,
    /// ISO week (`YYYY-Www`, ISO week-numbering year)
    Week,
    /// Calendar month (`YYYY-MM`)
    Month,
}

impl BucketSize {
    /// Label of the bucket containing `date`
    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let week = date.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Self::Month => format!("{:04}-{:02}", date.year(), date.month()),
        }
    }

    pub fn all() -> &'static [BucketSize] {
        &[Self::Day, Self::Week, Self::Month]
    }
}

impl fmt::Display for BucketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
        }
    }
}

impl FromStr for BucketSize {
    type Err = BucketParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" | "daily" | "d" => Ok(Self::Day),
            "week" | "weekly" | "w" => Ok(Self::Week),
            "month" | "monthly" | "m" => Ok(Self::Month),
            other => Err(BucketParseError(other.to_string())),
        }
    }
}

/// Error type for bucket size parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketParseError(pub String);

impl fmt::Display for BucketParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid bucket size '{}': expected day, week or month", self.0)
    }
}

impl std::error::Error for BucketParseError {}

/// Parse a record date as the data store returns it.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and zone-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]`. Anything else is `None`.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|dt| dt.date())
}

//! Query parameter types with readable parse errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// A date filter bound.
///
/// Accepts RFC 3339 (`2024-01-15T10:30:00Z`), ISO 8601 without timezone
/// (UTC assumed) or a bare date (`2024-01-15`). A bare date covers the
/// whole day: as a lower bound it starts at midnight, as an upper bound it
/// ends at the last instant of that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDate {
    Instant(DateTime<Utc>),
    Day(NaiveDate),
}

impl QueryDate {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("date value cannot be empty".to_string());
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Instant(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self::Instant(naive.and_utc()));
        }
        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::Day(day));
        }
        Err(format!(
            "invalid date '{}': expected YYYY-MM-DD or RFC 3339 (e.g. '2024-01-15T10:30:00Z')",
            s
        ))
    }

    pub fn start_bound(&self) -> DateTime<Utc> {
        match self {
            Self::Instant(dt) => *dt,
            Self::Day(day) => day.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    pub fn end_bound(&self) -> DateTime<Utc> {
        match self {
            Self::Instant(dt) => *dt,
            Self::Day(day) => {
                let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                    .unwrap_or(NaiveTime::MIN);
                day.and_time(last).and_utc()
            }
        }
    }
}

impl<'de> Deserialize<'de> for QueryDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        QueryDate::parse(&s).map_err(de::Error::custom)
    }
}

//! Time ranges given as `now`, `now-<duration>` or epoch milliseconds

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A resolved time range, keeping the raw bounds for the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Raw start, as given by the caller
    pub raw_from: String,
    /// Raw end, as given by the caller
    pub raw_to: String,
    /// Resolved start
    pub from: DateTime<Utc>,
    /// Resolved end
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Parse a time range relative to the current time
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        Self::parse_at(from, to, Utc::now())
    }

    /// Parse a time range relative to `now`
    pub fn parse_at(from: &str, to: &str, now: DateTime<Utc>) -> Result<Self> {
        let start = parse_bound(from, now)?;
        let end = parse_bound(to, now)?;
        if start > end {
            return Err(Error::InvalidTimeRange(format!(
                "from {from:?} is after to {to:?}"
            )));
        }

        Ok(Self {
            raw_from: from.to_string(),
            raw_to: to.to_string(),
            from: start,
            to: end,
        })
    }

    /// Start as epoch milliseconds
    pub fn from_epoch_ms(&self) -> i64 {
        self.from.timestamp_millis()
    }

    /// End as epoch milliseconds
    pub fn to_epoch_ms(&self) -> i64 {
        self.to.timestamp_millis()
    }
}

fn parse_bound(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if raw == "now" {
        return Ok(now);
    }

    if let Some(offset) = raw.strip_prefix("now-") {
        let duration = humantime::parse_duration(offset)
            .map_err(|e| Error::InvalidTimeRange(format!("{raw:?}: {e}")))?;
        let duration = Duration::from_std(duration)
            .map_err(|e| Error::InvalidTimeRange(format!("{raw:?}: {e}")))?;
        return Ok(now - duration);
    }

    let millis: i64 = raw
        .parse()
        .map_err(|_| Error::InvalidTimeRange(format!("{raw:?} is not now, now-<duration> or epoch milliseconds")))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::InvalidTimeRange(format!("{raw:?} is out of range")))
}

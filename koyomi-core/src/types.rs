//! # Core Types
//!
//! Fundamental data structures for the (duration, field, item) key space
//! and the two row layouts Koyomi stores.
//!
//! All time values are signed 64-bit microseconds since the Unix epoch,
//! and all intervals are half-open: `[begin, end)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Timestamp type used throughout the system: microseconds since epoch.
pub type Timestamp = i64;

/// Convert a UTC datetime to a store timestamp.
pub fn timestamp_from_datetime(dt: &DateTime<Utc>) -> Timestamp {
    dt.timestamp_micros()
}

/// Convert a store timestamp back to a UTC datetime.
///
/// Returns `None` for values outside chrono's representable range.
pub fn datetime_from_timestamp(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(ts)
}

/// Reserved suffix used to derive interval-observation field names.
/// Point-series field names may never end with it.
pub const RESERVED_FIELD_SUFFIX: &str = "_observation";

/// Opaque duration token identifying a series class (sampling granularity).
///
/// Rendered to a stable string so that the same duration always resolves
/// to the same storage branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DurationKey(String);

impl DurationKey {
    pub fn from_seconds(secs: i64) -> Self {
        Self(format!("{}s", secs))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<chrono::Duration> for DurationKey {
    fn from(d: chrono::Duration) -> Self {
        Self::from_seconds(d.num_seconds())
    }
}

impl From<&str> for DurationKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DurationKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for DurationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Series kind: point observations or interval observations.
/// No two kinds ever share a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    Point,
    Interval,
}

/// Three-level key identifying exactly one storage unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub duration: DurationKey,
    pub field: String,
    pub item: String,
}

impl SeriesKey {
    pub fn new(
        duration: impl Into<DurationKey>,
        field: impl Into<String>,
        item: impl Into<String>,
    ) -> Self {
        Self {
            duration: duration.into(),
            field: field.into(),
            item: item.into(),
        }
    }

    /// Reject field names that collide with the interval-derivation
    /// namespace. Enforced at every point-series entry point.
    pub fn validate_point_field(&self) -> Result<()> {
        if self.field.ends_with(RESERVED_FIELD_SUFFIX) {
            return Err(Error::InvalidKey {
                message: format!(
                    "field names may not end with the reserved suffix '{}': {}",
                    RESERVED_FIELD_SUFFIX, self.field
                ),
            });
        }
        Ok(())
    }

    /// Derived key under which interval observations for this field live.
    pub fn observation_key(&self) -> SeriesKey {
        SeriesKey {
            duration: self.duration.clone(),
            field: format!("{}{}", self.field, RESERVED_FIELD_SUFFIX),
            item: self.item.clone(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.duration, self.field, self.item)
    }
}

/// One point observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRow {
    pub time: Timestamp,
    pub value: f64,
}

/// Column bounds for interval-observation string fields.
pub const STATUS_MAX_LEN: usize = 16;
pub const SOURCE_MAX_LEN: usize = 64;
pub const COMMENT_MAX_LEN: usize = 255;

/// A claim that the half-open interval `[begin_time, end_time)` was
/// observed, with metadata about how. Overlapping observations for the
/// same key are allowed and expected; `confidence` disambiguates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalObservation {
    pub begin_time: Timestamp,
    pub end_time: Timestamp,
    /// When the observation was recorded.
    pub timestamp: Timestamp,
    pub confidence: f64,
    pub status: String,
    pub source: String,
    pub comment: String,
}

impl IntervalObservation {
    pub fn new(begin_time: Timestamp, end_time: Timestamp, timestamp: Timestamp) -> Self {
        Self {
            begin_time,
            end_time,
            timestamp,
            confidence: 0.0,
            status: String::new(),
            source: String::new(),
            comment: String::new(),
        }
    }

    /// Half-open overlap test against `[begin, end)`.
    pub fn overlaps(&self, begin: Timestamp, end: Timestamp) -> bool {
        self.end_time > begin && end > self.begin_time
    }
}

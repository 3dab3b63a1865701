//! # Gap Analyzer
//!
//! Pure composition over interval-observation query results: finds
//! sub-intervals of a requested window not covered by any sufficiently
//! confident observation. Never touches the storage engine directly.
//!
//! Both scanning loops are monotonic: each iteration either terminates or
//! strictly advances toward the opposite window boundary, so a call makes
//! at most O(overlapping observations) queries.

use koyomi_core::error::{Error, Result};
use koyomi_core::{DurationKey, SeriesKey, Timestamp};

use crate::intervals::IntervalObservationStore;

/// The minimal interval guaranteed to contain all uncovered time within a
/// window. `None` on a side means that side of the window is covered; both
/// `None` means the window is fully covered. The hull is not a precise gap
/// set: fully-covered sub-ranges inside it are possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnobservedHull {
    pub begin: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl UnobservedHull {
    /// Union of two hulls: min of begins, max of ends, with `None`
    /// absorbing to the other value.
    pub fn union(&self, other: &UnobservedHull) -> UnobservedHull {
        UnobservedHull {
            begin: merge(self.begin, other.begin, std::cmp::min),
            end: merge(self.end, other.end, std::cmp::max),
        }
    }

    pub fn is_fully_covered(&self) -> bool {
        self.begin.is_none() && self.end.is_none()
    }
}

fn merge(
    a: Option<Timestamp>,
    b: Option<Timestamp>,
    pick: impl Fn(Timestamp, Timestamp) -> Timestamp,
) -> Option<Timestamp> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

#[derive(Clone)]
pub struct GapAnalyzer {
    intervals: IntervalObservationStore,
}

impl GapAnalyzer {
    pub fn new(intervals: IntervalObservationStore) -> Self {
        Self { intervals }
    }

    /// Earliest uncovered time within `[begin, end)`, or `None` if the
    /// window is fully covered.
    pub fn earliest_unobserved(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
        confidence_threshold: Option<f64>,
    ) -> Result<Option<Timestamp>> {
        let mut time = begin;
        while time < end {
            match self
                .intervals
                .earliest_overlapping(key, time, end, confidence_threshold)?
            {
                Some(obs) if obs.begin_time <= time => time = obs.end_time,
                _ => return Ok(Some(time)),
            }
        }
        Ok(None)
    }

    /// Latest uncovered time within `[begin, end)`: the backward-scanning
    /// mirror of `earliest_unobserved`.
    pub fn latest_unobserved(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
        confidence_threshold: Option<f64>,
    ) -> Result<Option<Timestamp>> {
        let mut time = end;
        while begin < time {
            match self
                .intervals
                .latest_overlapping(key, begin, time, confidence_threshold)?
            {
                Some(obs) if obs.end_time >= time => time = obs.begin_time,
                _ => return Ok(Some(time)),
            }
        }
        Ok(None)
    }

    /// Pair of earliest and latest unobserved times within the window.
    pub fn unobserved_hull(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
        confidence_threshold: Option<f64>,
    ) -> Result<UnobservedHull> {
        Ok(UnobservedHull {
            begin: self.earliest_unobserved(key, begin, end, confidence_threshold)?,
            end: self.latest_unobserved(key, begin, end, confidence_threshold)?,
        })
    }

    /// Union of per-field unobserved hulls for one item. Requires at
    /// least one field.
    pub fn unobserved_hull_over_fields(
        &self,
        duration: &DurationKey,
        item: &str,
        fields: &[&str],
        begin: Timestamp,
        end: Timestamp,
        confidence_threshold: Option<f64>,
    ) -> Result<UnobservedHull> {
        let (first, rest) = fields.split_first().ok_or_else(|| Error::InvalidKey {
            message: "unobserved_hull_over_fields requires at least one field".to_string(),
        })?;

        let key = SeriesKey::new(duration.clone(), *first, item);
        let mut hull = self.unobserved_hull(&key, begin, end, confidence_threshold)?;
        for field in rest {
            let key = SeriesKey::new(duration.clone(), *field, item);
            let next = self.unobserved_hull(&key, begin, end, confidence_threshold)?;
            hull = hull.union(&next);
        }
        Ok(hull)
    }
}

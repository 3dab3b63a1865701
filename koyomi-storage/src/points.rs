//! # Point Series Store
//!
//! Reads and writes of scalar point observations. Every entry point
//! rejects field names ending in the reserved `_observation` suffix, which
//! is held back for interval-series derivation.

use std::sync::Arc;

use koyomi_core::error::{Error, Result};
use koyomi_core::{PointRow, SeriesKey, SeriesKind, Timestamp};

use crate::predicate::{CmpOp, Predicate};
use crate::schema::{col, Row, Value};
use crate::session::RecoveringSession;

#[derive(Clone)]
pub struct PointSeriesStore {
    session: Arc<RecoveringSession>,
}

impl PointSeriesStore {
    pub fn new(session: Arc<RecoveringSession>) -> Self {
        Self { session }
    }

    /// Exact-match lookup. Not-found is a recoverable outcome the caller
    /// may translate to a default; the session never retries it.
    pub fn get(&self, key: &SeriesKey, time: Timestamp) -> Result<PointRow> {
        key.validate_point_field()?;
        self.session.metrics().record_read();
        self.session.with_table(key, SeriesKind::Point, |engine, table| {
            let pred = Predicate::cmp(col::TIME, CmpOp::Eq, Value::Int(time));
            let hits = engine.read_where(table, &pred)?;
            match hits.into_iter().next() {
                Some((_, row)) => decode_point(&row),
                None => Err(Error::NotFound {
                    duration: key.duration.to_string(),
                    field: key.field.clone(),
                    item: key.item.clone(),
                    time,
                }),
            }
        })
    }

    /// `get`, with `NotFound` translated to `default`.
    pub fn get_or(&self, key: &SeriesKey, time: Timestamp, default: f64) -> Result<f64> {
        match self.get(key, time) {
            Ok(row) => Ok(row.value),
            Err(Error::NotFound { .. }) => Ok(default),
            Err(e) => Err(e),
        }
    }

    /// Upsert by exact time match. If duplicate rows already exist at
    /// `time` (from prior `append` calls), only the first match is
    /// replaced. Known quirk; callers relying on dedup must avoid mixing
    /// `append` and `put` at the same time.
    pub fn put(&self, key: &SeriesKey, time: Timestamp, value: f64) -> Result<()> {
        key.validate_point_field()?;
        self.session.with_table(key, SeriesKind::Point, |engine, table| {
            let pred = Predicate::cmp(col::TIME, CmpOp::Eq, Value::Int(time));
            let hits = engine.read_where(table, &pred)?;
            let row = vec![Value::Int(time), Value::Float(value)];
            match hits.into_iter().next() {
                Some((row_id, _)) => engine.update_row(table, row_id, row),
                None => engine.append_row(table, row).map(|_| ()),
            }
        })?;
        self.session.metrics().record_point_write();
        Ok(())
    }

    /// Unconditional insert; duplicate times are permitted.
    pub fn append(&self, key: &SeriesKey, time: Timestamp, value: f64) -> Result<()> {
        key.validate_point_field()?;
        self.session.with_table(key, SeriesKind::Point, |engine, table| {
            let row = vec![Value::Int(time), Value::Float(value)];
            engine.append_row(table, row).map(|_| ())
        })?;
        self.session.metrics().record_point_write();
        Ok(())
    }

    /// Rows with `begin <= time < end`, in insertion order.
    pub fn select_range(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<PointRow>> {
        let pred = Predicate::cmp(col::TIME, CmpOp::Ge, Value::Int(begin))
            .and(col::TIME, CmpOp::Lt, Value::Int(end));
        self.select(key, pred)
    }

    /// Raw predicate scan over the point columns.
    pub fn select(&self, key: &SeriesKey, predicate: Predicate) -> Result<Vec<PointRow>> {
        key.validate_point_field()?;
        self.session.metrics().record_read();
        self.session.with_table(key, SeriesKind::Point, |engine, table| {
            let hits = engine.read_where(table, &predicate)?;
            hits.iter().map(|(_, row)| decode_point(row)).collect()
        })
    }

    /// Row with minimal time in `[begin, end)`. When several rows share
    /// the minimal time, the earliest-inserted one wins.
    pub fn first_in_range(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
    ) -> Result<Option<PointRow>> {
        let rows = self.select_range(key, begin, end)?;
        Ok(pick_extreme(rows, |best, row| row.time < best.time))
    }

    /// Row with maximal time in `[begin, end)`; insertion-order tie-break
    /// as for `first_in_range`.
    pub fn last_in_range(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
    ) -> Result<Option<PointRow>> {
        let rows = self.select_range(key, begin, end)?;
        Ok(pick_extreme(rows, |best, row| row.time > best.time))
    }

    /// The stored row closest to `time` within `search_radius`.
    ///
    /// An exact match always wins. Otherwise the nearer of the last row
    /// before and the first row after is returned; at equal distance the
    /// earlier (before) candidate wins.
    pub fn closest_in_time(
        &self,
        key: &SeriesKey,
        time: Timestamp,
        search_radius: i64,
    ) -> Result<Option<PointRow>> {
        match self.get(key, time) {
            Ok(row) => return Ok(Some(row)),
            Err(Error::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // Saturate so extreme timestamps or radii clamp the window
        // instead of overflowing.
        let last_before = self.last_in_range(key, time.saturating_sub(search_radius), time)?;
        let first_after = self.first_in_range(key, time, time.saturating_add(search_radius))?;

        Ok(match (last_before, first_after) {
            (Some(before), Some(after)) => {
                if after.time - time < time - before.time {
                    Some(after)
                } else {
                    Some(before)
                }
            }
            (Some(before), None) => Some(before),
            (None, Some(after)) => Some(after),
            (None, None) => None,
        })
    }
}

fn decode_point(row: &Row) -> Result<PointRow> {
    match row.as_slice() {
        [Value::Int(time), Value::Float(value)] => Ok(PointRow {
            time: *time,
            value: *value,
        }),
        _ => Err(Error::storage("malformed point row")),
    }
}

/// `better(best, candidate)` is true when the candidate strictly beats the
/// current best; ties therefore keep the earliest-inserted row.
fn pick_extreme(
    rows: Vec<PointRow>,
    better: impl Fn(&PointRow, &PointRow) -> bool,
) -> Option<PointRow> {
    let mut iter = rows.into_iter();
    let mut best = iter.next()?;
    for row in iter {
        if better(&best, &row) {
            best = row;
        }
    }
    Some(best)
}

//! # Interval Observation Store
//!
//! Interval observations are stored under a derived field name — the
//! caller's field plus the reserved `_observation` suffix — so they can
//! never collide with a point series. There is no merge or upsert for
//! intervals: overlapping observations are allowed and expected, and
//! `confidence` lets callers disambiguate.

use std::sync::Arc;

use koyomi_core::error::{Error, Result};
use koyomi_core::{IntervalObservation, SeriesKey, SeriesKind, Timestamp};

use crate::predicate::{CmpOp, Predicate};
use crate::schema::{col, Row, Value};
use crate::session::RecoveringSession;

#[derive(Clone)]
pub struct IntervalObservationStore {
    session: Arc<RecoveringSession>,
}

impl IntervalObservationStore {
    pub fn new(session: Arc<RecoveringSession>) -> Self {
        Self { session }
    }

    /// Unconditional insert. String fields longer than their column bound
    /// are truncated on write.
    pub fn append(&self, key: &SeriesKey, obs: &IntervalObservation) -> Result<()> {
        let storage_key = key.observation_key();
        self.session
            .with_table(&storage_key, SeriesKind::Interval, |engine, table| {
                engine.append_row(table, encode_interval(obs)).map(|_| ())
            })?;
        self.session.metrics().record_interval_write();
        Ok(())
    }

    /// All stored intervals overlapping `[begin, end)`, optionally
    /// restricted to `confidence >= confidence_threshold`, in insertion
    /// order.
    pub fn overlapping(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
        confidence_threshold: Option<f64>,
    ) -> Result<Vec<IntervalObservation>> {
        let storage_key = key.observation_key();
        self.session.metrics().record_read();

        let mut pred = Predicate::cmp(col::END_TIME, CmpOp::Gt, Value::Int(begin))
            .and(col::BEGIN_TIME, CmpOp::Lt, Value::Int(end));
        if let Some(threshold) = confidence_threshold {
            pred = pred.and(col::CONFIDENCE, CmpOp::Ge, Value::Float(threshold));
        }

        self.session
            .with_table(&storage_key, SeriesKind::Interval, |engine, table| {
                let hits = engine.read_where(table, &pred)?;
                hits.iter().map(|(_, row)| decode_interval(row)).collect()
            })
    }

    /// Overlapping observation with minimal `begin_time`; when several
    /// share it, the earliest-inserted one wins.
    pub fn earliest_overlapping(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
        confidence_threshold: Option<f64>,
    ) -> Result<Option<IntervalObservation>> {
        let rows = self.overlapping(key, begin, end, confidence_threshold)?;
        Ok(pick_extreme(rows, |best, row| row.begin_time < best.begin_time))
    }

    /// Overlapping observation with maximal `end_time`; insertion-order
    /// tie-break as for `earliest_overlapping`.
    pub fn latest_overlapping(
        &self,
        key: &SeriesKey,
        begin: Timestamp,
        end: Timestamp,
        confidence_threshold: Option<f64>,
    ) -> Result<Option<IntervalObservation>> {
        let rows = self.overlapping(key, begin, end, confidence_threshold)?;
        Ok(pick_extreme(rows, |best, row| row.end_time > best.end_time))
    }
}

fn encode_interval(obs: &IntervalObservation) -> Row {
    vec![
        Value::Int(obs.begin_time),
        Value::Int(obs.end_time),
        Value::Int(obs.timestamp),
        Value::Float(obs.confidence),
        Value::Str(obs.status.clone()),
        Value::Str(obs.source.clone()),
        Value::Str(obs.comment.clone()),
    ]
}

fn decode_interval(row: &Row) -> Result<IntervalObservation> {
    match row.as_slice() {
        [Value::Int(begin_time), Value::Int(end_time), Value::Int(timestamp), Value::Float(confidence), Value::Str(status), Value::Str(source), Value::Str(comment)] => {
            Ok(IntervalObservation {
                begin_time: *begin_time,
                end_time: *end_time,
                timestamp: *timestamp,
                confidence: *confidence,
                status: status.clone(),
                source: source.clone(),
                comment: comment.clone(),
            })
        }
        _ => Err(Error::storage("malformed interval observation row")),
    }
}

/// Strict-improvement selection, keeping the earliest-inserted row on ties.
fn pick_extreme(
    rows: Vec<IntervalObservation>,
    better: impl Fn(&IntervalObservation, &IntervalObservation) -> bool,
) -> Option<IntervalObservation> {
    let mut iter = rows.into_iter();
    let mut best = iter.next()?;
    for row in iter {
        if better(&best, &row) {
            best = row;
        }
    }
    Some(best)
}

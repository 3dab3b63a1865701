//! # TimeSeriesStore
//!
//! Assembles the session and the three store views over one backing file.

use std::sync::Arc;

use koyomi_core::error::Result;
use koyomi_core::{MetricsSnapshot, StoreConfig};

use crate::backend::BackendFactory;
use crate::gaps::GapAnalyzer;
use crate::intervals::IntervalObservationStore;
use crate::points::PointSeriesStore;
use crate::session::RecoveringSession;

pub struct TimeSeriesStore {
    session: Arc<RecoveringSession>,
    points: PointSeriesStore,
    intervals: IntervalObservationStore,
    gaps: GapAnalyzer,
}

impl TimeSeriesStore {
    /// Open (or create) the backing file with the default engine.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::from_session(RecoveringSession::open(config)?)
    }

    /// Open with a caller-supplied engine factory (used by tests to
    /// inject faults).
    pub fn open_with_factory(config: StoreConfig, factory: Box<BackendFactory>) -> Result<Self> {
        Self::from_session(RecoveringSession::open_with_factory(config, factory)?)
    }

    fn from_session(session: RecoveringSession) -> Result<Self> {
        let session = Arc::new(session);
        let points = PointSeriesStore::new(Arc::clone(&session));
        let intervals = IntervalObservationStore::new(Arc::clone(&session));
        let gaps = GapAnalyzer::new(intervals.clone());
        Ok(Self {
            session,
            points,
            intervals,
            gaps,
        })
    }

    pub fn points(&self) -> &PointSeriesStore {
        &self.points
    }

    pub fn intervals(&self) -> &IntervalObservationStore {
        &self.intervals
    }

    pub fn gaps(&self) -> &GapAnalyzer {
        &self.gaps
    }

    /// Durably flush the backing file.
    pub fn flush(&self) -> Result<()> {
        self.session.flush()
    }

    /// Flush and close the backing handle.
    pub fn close(&self) -> Result<()> {
        self.session.close()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.session.metrics().snapshot()
    }
}

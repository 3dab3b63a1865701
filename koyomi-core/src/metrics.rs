//! # Metrics and Monitoring
//!
//! Lightweight counters for monitoring a store instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    points_written: AtomicU64,
    intervals_written: AtomicU64,
    reads: AtomicU64,
    flushes: AtomicU64,
    recovered_faults: AtomicU64,
    fatal_faults: AtomicU64,
}

/// Point-in-time snapshot of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub points_written: u64,
    pub intervals_written: u64,
    pub reads: u64,
    pub flushes: u64,
    pub recovered_faults: u64,
    pub fatal_faults: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                points_written: AtomicU64::new(0),
                intervals_written: AtomicU64::new(0),
                reads: AtomicU64::new(0),
                flushes: AtomicU64::new(0),
                recovered_faults: AtomicU64::new(0),
                fatal_faults: AtomicU64::new(0),
            }),
        }
    }

    pub fn record_point_write(&self) {
        self.inner.points_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_interval_write(&self) {
        self.inner.intervals_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read(&self) {
        self.inner.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flush(&self) {
        self.inner.flushes.fetch_add(1, Ordering::Relaxed);
    }

    /// A storage fault was recovered by close/reopen/retry.
    pub fn record_recovered_fault(&self) {
        self.inner.recovered_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// The bounded retry also failed; the error propagated.
    pub fn record_fatal_fault(&self) {
        self.inner.fatal_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            points_written: self.inner.points_written.load(Ordering::Relaxed),
            intervals_written: self.inner.intervals_written.load(Ordering::Relaxed),
            reads: self.inner.reads.load(Ordering::Relaxed),
            flushes: self.inner.flushes.load(Ordering::Relaxed),
            recovered_faults: self.inner.recovered_faults.load(Ordering::Relaxed),
            fatal_faults: self.inner.fatal_faults.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

//! # Recovering Session
//!
//! Owns the single open handle to the backing store and the one
//! mutual-exclusion lock that serializes every operation: resolve table,
//! execute, flush all happen under it. There is no per-table locking, so
//! throughput across unrelated series is serialized; this is a documented
//! limitation of the single-writer design.
//!
//! ## Failure handling
//!
//! A recoverable fault during resolve or execute is assumed to stem from a
//! corrupted in-memory handle rather than a persistent condition, so the
//! session closes the handle, reopens the backing file fresh, re-resolves
//! and retries the operation exactly once. A second failure propagates.
//! `Interrupted`, `NotFound` and `InvalidKey` are never retried.

use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::warn;

use koyomi_core::error::Result;
use koyomi_core::{Metrics, SeriesKey, SeriesKind, StoreConfig};

use crate::backend::{BackendFactory, TableEngine, TableId};
use crate::catalog::HierarchicalCatalog;

pub struct RecoveringSession {
    path: PathBuf,
    flush_on_write: bool,
    catalog: HierarchicalCatalog,
    factory: Box<BackendFactory>,
    metrics: Metrics,
    engine: Mutex<Box<dyn TableEngine>>,
}

impl RecoveringSession {
    /// Open the backing file with the default file-backed engine.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::open_with_factory(config, crate::backend::default_factory())
    }

    /// Open with a caller-supplied engine factory. The factory is also
    /// used for the reopen after a recovered fault, which is how tests
    /// inject engine failures.
    pub fn open_with_factory(config: StoreConfig, factory: Box<BackendFactory>) -> Result<Self> {
        let engine = factory(&config.path)?;
        Ok(Self {
            path: config.path,
            flush_on_write: config.flush_on_write,
            catalog: HierarchicalCatalog::new(config.index_fidelity),
            factory,
            metrics: Metrics::new(),
            engine: Mutex::new(engine),
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Acquire the session lock, resolve/create the table for `key`, run
    /// `op` against it, and flush on the way out (even on failure) when
    /// flush-on-write is enabled.
    pub fn with_table<R>(
        &self,
        key: &SeriesKey,
        kind: SeriesKind,
        mut op: impl FnMut(&mut dyn TableEngine, TableId) -> Result<R>,
    ) -> Result<R> {
        let mut engine = self.engine.lock();

        let result = match self.attempt(engine.as_mut(), key, kind, &mut op) {
            Err(e) if e.is_recoverable_fault() => {
                warn!(
                    key = %key,
                    code = e.error_code(),
                    error = %e,
                    "recoverable fault; closing and reopening backing file"
                );
                if let Err(close_err) = engine.close() {
                    warn!(error = %close_err, "failed to close broken handle");
                }
                match (self.factory)(&self.path) {
                    Ok(fresh) => {
                        *engine = fresh;
                        let retried = self.attempt(engine.as_mut(), key, kind, &mut op);
                        match &retried {
                            Ok(_) => self.metrics.record_recovered_fault(),
                            Err(_) => self.metrics.record_fatal_fault(),
                        }
                        retried
                    }
                    Err(open_err) => {
                        // No usable engine remains, so the flush-on-write
                        // tail below cannot run; the next operation starts
                        // over from a fresh reopen attempt.
                        self.metrics.record_fatal_fault();
                        return Err(open_err);
                    }
                }
            }
            other => other,
        };

        if self.flush_on_write {
            let flushed = engine.flush();
            let value = result?;
            flushed?;
            self.metrics.record_flush();
            Ok(value)
        } else {
            result
        }
    }

    fn attempt<R>(
        &self,
        engine: &mut dyn TableEngine,
        key: &SeriesKey,
        kind: SeriesKind,
        op: &mut impl FnMut(&mut dyn TableEngine, TableId) -> Result<R>,
    ) -> Result<R> {
        let table = self.catalog.resolve_or_create(engine, key, kind)?;
        op(engine, table)
    }

    /// Durably flush the backing file.
    pub fn flush(&self) -> Result<()> {
        self.engine.lock().flush()?;
        self.metrics.record_flush();
        Ok(())
    }

    /// Flush and close the backing handle.
    pub fn close(&self) -> Result<()> {
        self.engine.lock().close()
    }
}

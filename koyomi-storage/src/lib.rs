//! # Koyomi Storage
//!
//! Single-writer embedded time-series store over one durable file.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Call Path                             │
//! │                                                              │
//! │  PointSeriesStore / IntervalObservationStore                 │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  RecoveringSession ── lock ── fault-isolate ── flush         │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  HierarchicalCatalog ── duration ─> field ─> item table      │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  TableEngine (FileBackend) ── one durable file               │
//! │                                                              │
//! │  GapAnalyzer composes on IntervalObservationStore queries    │
//! │  only; it never touches the engine.                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One mutex serializes every operation; a recoverable storage fault is
//! answered with close + reopen + retry-once before propagating.

pub mod backend;
pub mod catalog;
pub mod gaps;
pub mod intervals;
pub mod points;
pub mod predicate;
pub mod schema;
pub mod session;
pub mod store;

pub use backend::{BackendFactory, FileBackend, GroupId, RowId, TableEngine, TableId};
pub use catalog::HierarchicalCatalog;
pub use gaps::{GapAnalyzer, UnobservedHull};
pub use intervals::IntervalObservationStore;
pub use points::PointSeriesStore;
pub use predicate::{CmpOp, Comparison, Predicate};
pub use schema::{ColumnSpec, ColumnType, Row, TableSchema, Value};
pub use session::RecoveringSession;
pub use store::TimeSeriesStore;

//! # Koyomi Core
//!
//! Fundamental building blocks for Koyomi, an embedded time-series store
//! keyed by (duration, field, item):
//! - Core types (series keys, row layouts, timestamps)
//! - Error types
//! - Configuration
//! - Metrics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   koyomi-core                   │
//! ├─────────────────────────────────────────────────┤
//! │  • types   - Series keys, rows, timestamps      │
//! │  • error   - Error handling                     │
//! │  • config  - Store configuration                │
//! │  • metrics - Operation counters                 │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// Re-export commonly used types
pub use config::{IndexFidelity, StoreConfig};
pub use error::{Error, Result};
pub use metrics::{Metrics, MetricsSnapshot};
pub use types::{
    DurationKey, IntervalObservation, PointRow, SeriesKey, SeriesKind, Timestamp,
    RESERVED_FIELD_SUFFIX,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

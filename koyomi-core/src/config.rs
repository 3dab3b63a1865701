//! # Configuration Management
//!
//! Construction parameters for a Koyomi store.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index build fidelity: a build-cost/quality tradeoff chosen at table
/// creation time, not a correctness concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexFidelity {
    /// Fully optimized range indexes; slower table creation.
    Full,
    /// Lightly optimized indexes; cheaper to build.
    Light,
}

impl Default for IndexFidelity {
    fn default() -> Self {
        IndexFidelity::Full
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the single backing file.
    pub path: PathBuf,
    pub index_fidelity: IndexFidelity,
    /// Durably flush after every mutation (vs. buffering until an
    /// explicit flush or close).
    pub flush_on_write: bool,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index_fidelity: IndexFidelity::default(),
            flush_on_write: true,
        }
    }
}

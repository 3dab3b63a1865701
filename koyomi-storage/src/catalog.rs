//! # Hierarchical Catalog
//!
//! Lazily creates and locates one storage unit per (duration, field, item).
//! The namespace is a three-level tree: duration group → field group →
//! item table. Resolution is idempotent; creation races cannot occur
//! because every call holds the session lock.
//!
//! After creating any group or table the backing file is flushed before
//! returning, so a crash between group creation and table creation cannot
//! leave a half-created branch invisible to subsequent opens.

use tracing::debug;

use koyomi_core::error::Result;
use koyomi_core::{IndexFidelity, SeriesKey, SeriesKind};

use crate::backend::{GroupId, TableEngine, TableId};
use crate::schema::{col, TableSchema};

pub struct HierarchicalCatalog {
    fidelity: IndexFidelity,
}

impl HierarchicalCatalog {
    pub fn new(fidelity: IndexFidelity) -> Self {
        Self { fidelity }
    }

    /// Resolve the table for `key`/`kind`, creating the missing tail of
    /// the branch on first use. Must be called with the session lock held.
    pub fn resolve_or_create(
        &self,
        engine: &mut dyn TableEngine,
        key: &SeriesKey,
        kind: SeriesKind,
    ) -> Result<TableId> {
        let duration = key.duration.as_str();
        match engine.find_group(GroupId::ROOT, duration)? {
            None => {
                // Whole branch is new: no existence re-checks needed below
                // the duration group while the lock is held.
                let created = (|| {
                    let duration_group = engine.create_group(GroupId::ROOT, duration)?;
                    let field_group = engine.create_group(duration_group, &key.field)?;
                    self.create_table(engine, field_group, key, kind)
                })();
                finish_creation(engine, created)
            }
            Some(duration_group) => match engine.find_group(duration_group, &key.field)? {
                None => {
                    let created = (|| {
                        let field_group = engine.create_group(duration_group, &key.field)?;
                        self.create_table(engine, field_group, key, kind)
                    })();
                    finish_creation(engine, created)
                }
                Some(field_group) => match engine.find_table(field_group, &key.item)? {
                    None => {
                        let created = self.create_table(engine, field_group, key, kind);
                        finish_creation(engine, created)
                    }
                    Some(table) => Ok(table),
                },
            },
        }
    }

    fn create_table(
        &self,
        engine: &mut dyn TableEngine,
        group: GroupId,
        key: &SeriesKey,
        kind: SeriesKind,
    ) -> Result<TableId> {
        let table = match kind {
            SeriesKind::Point => {
                let table = engine.create_table(group, &key.item, TableSchema::point())?;
                engine.create_index(table, col::TIME, self.fidelity)?;
                table
            }
            SeriesKind::Interval => {
                let table = engine.create_table(group, &key.item, TableSchema::interval())?;
                engine.create_index(table, col::BEGIN_TIME, self.fidelity)?;
                engine.create_index(table, col::END_TIME, self.fidelity)?;
                table
            }
        };
        debug!(key = %key, ?kind, "created storage unit");
        Ok(table)
    }
}

/// Flush after any creation attempt, even a failed one; the creation
/// error takes precedence over a flush error.
fn finish_creation(engine: &mut dyn TableEngine, created: Result<TableId>) -> Result<TableId> {
    let flushed = engine.flush();
    let table = created?;
    flushed?;
    Ok(table)
}

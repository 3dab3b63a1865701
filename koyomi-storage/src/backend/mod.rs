//! # Storage Engine Adapter
//!
//! The catalog and session talk to the backing store through the
//! [`TableEngine`] trait: create group, create table with indexed columns,
//! predicate range reads, append/update, flush, close. The trait owns
//! on-disk durability; everything above it is layout- and format-agnostic.
//!
//! Handles (`GroupId`, `TableId`, `RowId`) are only valid for the engine
//! instance that issued them. The session re-resolves tables through the
//! catalog after every reopen, so stale handles never cross a recovery.

use std::path::Path;

use koyomi_core::error::Result;
use koyomi_core::IndexFidelity;

use crate::predicate::Predicate;
use crate::schema::{Row, TableSchema};

mod file;

pub use file::FileBackend;

/// Handle to a group node. The root group always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) u32);

impl GroupId {
    pub const ROOT: GroupId = GroupId(0);
}

/// Handle to a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub(crate) u32);

/// Handle to a row within a table. Stable for the life of the backing
/// file: no delete path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(pub(crate) u64);

/// Indexed columnar storage over a single durable file.
pub trait TableEngine: Send {
    fn find_group(&self, parent: GroupId, name: &str) -> Result<Option<GroupId>>;

    fn create_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId>;

    fn find_table(&self, group: GroupId, name: &str) -> Result<Option<TableId>>;

    fn create_table(&mut self, group: GroupId, name: &str, schema: TableSchema)
        -> Result<TableId>;

    fn create_index(&mut self, table: TableId, column: &str, fidelity: IndexFidelity)
        -> Result<()>;

    /// Rows matching the predicate, in insertion order.
    fn read_where(&self, table: TableId, predicate: &Predicate) -> Result<Vec<(RowId, Row)>>;

    fn append_row(&mut self, table: TableId, row: Row) -> Result<RowId>;

    fn update_row(&mut self, table: TableId, row: RowId, fields: Row) -> Result<()>;

    /// Durably persist buffered state.
    fn flush(&mut self) -> Result<()>;

    /// Flush and release the backing file. Further calls fail.
    fn close(&mut self) -> Result<()>;
}

/// Constructor for backing engines; the session uses it both for the
/// initial open and for the reopen after a recovered fault.
pub type BackendFactory = dyn Fn(&Path) -> Result<Box<dyn TableEngine>> + Send + Sync;

/// The default factory, producing a [`FileBackend`].
pub fn default_factory() -> Box<BackendFactory> {
    Box::new(|path| Ok(Box::new(FileBackend::open(path)?)))
}

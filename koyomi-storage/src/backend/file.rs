//! File-backed table engine.
//!
//! The whole namespace (groups, tables, schemas, index specs, rows) lives
//! in one MessagePack document. `flush` writes a temp file next to the
//! target, fsyncs, and renames over it, so a crash mid-flush leaves the
//! previous generation intact.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use koyomi_core::error::{Error, Result};
use koyomi_core::IndexFidelity;

use crate::predicate::Predicate;
use crate::schema::{Row, TableSchema};

use super::{GroupId, RowId, TableEngine, TableId};

#[derive(Debug, Serialize, Deserialize)]
struct GroupNode {
    parent: Option<u32>,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexSpec {
    column: String,
    fidelity: IndexFidelity,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableNode {
    group: u32,
    name: String,
    schema: TableSchema,
    indexes: Vec<IndexSpec>,
    rows: Vec<Row>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    groups: Vec<GroupNode>,
    tables: Vec<TableNode>,
}

impl Document {
    fn empty() -> Self {
        Self {
            // groups[0] is the implicit root
            groups: vec![GroupNode {
                parent: None,
                name: String::new(),
            }],
            tables: Vec::new(),
        }
    }
}

pub struct FileBackend {
    path: PathBuf,
    doc: Document,
    dirty: bool,
    closed: bool,
}

impl FileBackend {
    /// Open the backing file at `path`, creating an empty namespace if it
    /// does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = if path.exists() {
            let bytes = fs::read(&path)?;
            rmp_serde::from_slice(&bytes).map_err(|e| Error::Storage {
                message: format!("failed to decode backing file {}: {}", path.display(), e),
                source: Some(Box::new(e)),
            })?
        } else {
            Document::empty()
        };
        info!(
            path = %path.display(),
            groups = doc.groups.len(),
            tables = doc.tables.len(),
            "opened backing file"
        );
        Ok(Self {
            path,
            doc,
            dirty: false,
            closed: false,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::storage("backing file is closed"));
        }
        Ok(())
    }

    fn group_node(&self, id: GroupId) -> Result<&GroupNode> {
        self.doc
            .groups
            .get(id.0 as usize)
            .ok_or_else(|| Error::storage(format!("stale group handle {:?}", id)))
    }

    fn table_node(&self, id: TableId) -> Result<&TableNode> {
        self.doc
            .tables
            .get(id.0 as usize)
            .ok_or_else(|| Error::storage(format!("stale table handle {:?}", id)))
    }

    fn table_node_mut(&mut self, id: TableId) -> Result<&mut TableNode> {
        self.doc
            .tables
            .get_mut(id.0 as usize)
            .ok_or_else(|| Error::storage(format!("stale table handle {:?}", id)))
    }
}

impl TableEngine for FileBackend {
    fn find_group(&self, parent: GroupId, name: &str) -> Result<Option<GroupId>> {
        self.check_open()?;
        self.group_node(parent)?;
        let found = self
            .doc
            .groups
            .iter()
            .position(|g| g.parent == Some(parent.0) && g.name == name);
        Ok(found.map(|i| GroupId(i as u32)))
    }

    fn create_group(&mut self, parent: GroupId, name: &str) -> Result<GroupId> {
        self.check_open()?;
        self.group_node(parent)?;
        if self.find_group(parent, name)?.is_some() {
            return Err(Error::storage(format!("group '{}' already exists", name)));
        }
        self.doc.groups.push(GroupNode {
            parent: Some(parent.0),
            name: name.to_string(),
        });
        self.dirty = true;
        Ok(GroupId((self.doc.groups.len() - 1) as u32))
    }

    fn find_table(&self, group: GroupId, name: &str) -> Result<Option<TableId>> {
        self.check_open()?;
        self.group_node(group)?;
        let found = self
            .doc
            .tables
            .iter()
            .position(|t| t.group == group.0 && t.name == name);
        Ok(found.map(|i| TableId(i as u32)))
    }

    fn create_table(
        &mut self,
        group: GroupId,
        name: &str,
        schema: TableSchema,
    ) -> Result<TableId> {
        self.check_open()?;
        self.group_node(group)?;
        if self.find_table(group, name)?.is_some() {
            return Err(Error::storage(format!("table '{}' already exists", name)));
        }
        self.doc.tables.push(TableNode {
            group: group.0,
            name: name.to_string(),
            schema,
            indexes: Vec::new(),
            rows: Vec::new(),
        });
        self.dirty = true;
        Ok(TableId((self.doc.tables.len() - 1) as u32))
    }

    fn create_index(
        &mut self,
        table: TableId,
        column: &str,
        fidelity: IndexFidelity,
    ) -> Result<()> {
        self.check_open()?;
        let node = self.table_node_mut(table)?;
        if node.schema.column_index(column).is_none() {
            return Err(Error::storage(format!(
                "cannot index unknown column '{}'",
                column
            )));
        }
        // Fidelity is recorded as a build-cost knob; reads scan either way.
        node.indexes.push(IndexSpec {
            column: column.to_string(),
            fidelity,
        });
        self.dirty = true;
        Ok(())
    }

    fn read_where(&self, table: TableId, predicate: &Predicate) -> Result<Vec<(RowId, Row)>> {
        self.check_open()?;
        let node = self.table_node(table)?;
        let mut hits = Vec::new();
        for (i, row) in node.rows.iter().enumerate() {
            if predicate.matches(&node.schema, row)? {
                hits.push((RowId(i as u64), row.clone()));
            }
        }
        Ok(hits)
    }

    fn append_row(&mut self, table: TableId, row: Row) -> Result<RowId> {
        self.check_open()?;
        let node = self.table_node_mut(table)?;
        let row = node.schema.conform_row(row)?;
        node.rows.push(row);
        let id = RowId((node.rows.len() - 1) as u64);
        self.dirty = true;
        Ok(id)
    }

    fn update_row(&mut self, table: TableId, row: RowId, fields: Row) -> Result<()> {
        self.check_open()?;
        let node = self.table_node_mut(table)?;
        let fields = node.schema.conform_row(fields)?;
        let slot = node
            .rows
            .get_mut(row.0 as usize)
            .ok_or_else(|| Error::storage(format!("stale row handle {:?}", row)))?;
        *slot = fields;
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        if !self.dirty {
            return Ok(());
        }
        let bytes = rmp_serde::to_vec(&self.doc).map_err(|e| Error::Storage {
            message: format!("failed to encode backing file: {}", e),
            source: Some(Box::new(e)),
        })?;
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        self.dirty = false;
        debug!(path = %self.path.display(), bytes = bytes.len(), "flushed backing file");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.closed = true;
        info!(path = %self.path.display(), "closed backing file");
        Ok(())
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

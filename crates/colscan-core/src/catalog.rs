//! Table, column, and index descriptors.
//!
//! These are the hydratable shapes the scan operator reads its projection
//! from. Resolution of descriptors out of the catalog (leasing, versioning)
//! happens upstream; here they are plain immutable data shared via `Arc`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::{ColumnId, IndexId, TableId};
use crate::schema::ColumnType;
use crate::time::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnVisibility {
    Public,
    /// Mutation columns (mid-schema-change) readable only when the scan
    /// explicitly asks for non-public columns.
    NotPublic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub name: String,
    pub typ: ColumnType,
    pub visibility: ColumnVisibility,
    /// Synthesized system column (mvcc timestamp, tableoid, ...). System
    /// columns are appended as a trailing block after user columns.
    pub system: bool,
}

impl ColumnDescriptor {
    pub fn new(id: ColumnId, name: impl Into<String>, typ: ColumnType) -> Self {
        Self {
            id,
            name: name.into(),
            typ,
            visibility: ColumnVisibility::Public,
            system: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub id: IndexId,
    pub name: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub id: TableId,
    pub name: String,
    columns: Vec<Arc<ColumnDescriptor>>,
    system_columns: Vec<Arc<ColumnDescriptor>>,
    indexes: Vec<IndexDescriptor>,
    /// Last schema-change time; raises the bounded-staleness min bound so a
    /// stale read never observes data under an older schema.
    pub modification_time: Timestamp,
}

impl TableDescriptor {
    pub fn new(
        id: TableId,
        name: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
        indexes: Vec<IndexDescriptor>,
    ) -> Self {
        let (system, user): (Vec<_>, Vec<_>) = columns.into_iter().partition(|c| c.system);
        Self {
            id,
            name: name.into(),
            columns: user.into_iter().map(Arc::new).collect(),
            system_columns: system.into_iter().map(Arc::new).collect(),
            indexes,
            modification_time: Timestamp::default(),
        }
    }

    pub fn with_modification_time(mut self, ts: Timestamp) -> Self {
        self.modification_time = ts;
        self
    }

    /// Public user columns only.
    pub fn public_columns(&self) -> impl Iterator<Item = &Arc<ColumnDescriptor>> {
        self.columns
            .iter()
            .filter(|c| c.visibility == ColumnVisibility::Public)
    }

    /// All readable user columns: public plus in-progress mutation columns.
    pub fn readable_columns(&self) -> impl Iterator<Item = &Arc<ColumnDescriptor>> {
        self.columns.iter()
    }

    pub fn system_columns(&self) -> impl Iterator<Item = &Arc<ColumnDescriptor>> {
        self.system_columns.iter()
    }

    /// Index by its position among the table's active indexes.
    pub fn active_index(&self, ordinal: usize) -> Result<&IndexDescriptor> {
        self.indexes.get(ordinal).ok_or_else(|| {
            Error::Catalog(format!(
                "table {} has no active index at ordinal {}",
                self.name, ordinal
            ))
        })
    }

    pub fn find_column(&self, id: ColumnId) -> Option<&Arc<ColumnDescriptor>> {
        self.columns
            .iter()
            .chain(self.system_columns.iter())
            .find(|c| c.id == id)
    }

    /// The inverted variant of a column, when an inverted index over it is
    /// being scanned. Identity (ColumnId) stays that of the base column; the
    /// type is the inverted encoding's type.
    pub fn find_inverted_column(&self, id: ColumnId) -> Option<Arc<ColumnDescriptor>> {
        self.find_column(id).map(|base| {
            Arc::new(ColumnDescriptor {
                id: base.id,
                name: format!("{}_inverted_key", base.name),
                typ: ColumnType::Builtin(crate::schema::DataType::Binary),
                visibility: base.visibility,
                system: base.system,
            })
        })
    }
}

//! Column-projection resolution.
//!
//! Given a table descriptor, the target index, visibility mode, and the
//! system-column flag, compute the ordered column list the fetch engine
//! materializes, the column-id to ordinal map, and the hydrated type list.
//! Projections are pooled: `reset` clears every descriptor reference (not
//! merely truncates) so pooled instances never pin a previous query's
//! descriptor graph.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use colscan_core::catalog::{ColumnDescriptor, IndexDescriptor, TableDescriptor};
use colscan_core::error::{Error, Result};
use colscan_core::id::{ColumnId, IndexId};
use colscan_core::schema::{ColumnType, TypeResolver};

use crate::pool::{ObjectPool, Poolable};
use crate::spec::ScanVisibility;

#[derive(Debug, Default)]
pub struct ColumnProjection {
    pub table: Option<Arc<TableDescriptor>>,
    pub index: Option<IndexId>,
    pub is_secondary_index: bool,
    /// Columns in projection order: user columns (with the inverted variant
    /// substituted in place when applicable), then system columns.
    pub columns: Vec<Arc<ColumnDescriptor>>,
    /// ColumnId -> ordinal in `columns`.
    pub col_idx_map: HashMap<ColumnId, usize>,
    /// Hydrated types, parallel to `columns`.
    pub types: Vec<ColumnType>,
    /// Ordinals the scan must materialize. Populated by the caller after
    /// resolution; the resolver does not decide what is needed.
    pub needed: BTreeSet<usize>,
}

impl ColumnProjection {
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// `types.len() == columns.len()` and every needed ordinal in range.
    pub fn check_invariants(&self) -> Result<()> {
        if self.types.len() != self.columns.len() {
            return Err(Error::Internal(format!(
                "projection has {} types for {} columns",
                self.types.len(),
                self.columns.len()
            )));
        }
        if let Some(&max) = self.needed.iter().next_back() {
            if max >= self.columns.len() {
                return Err(Error::Internal(format!(
                    "needed ordinal {} out of range for {} columns",
                    max,
                    self.columns.len()
                )));
            }
        }
        Ok(())
    }
}

impl Poolable for ColumnProjection {
    fn reset(&mut self) {
        self.table = None;
        self.index = None;
        self.is_secondary_index = false;
        // Dropping the Arcs releases the descriptor graph; the Vec keeps
        // its capacity for the next owner.
        self.columns.clear();
        self.col_idx_map.clear();
        self.types.clear();
        self.needed.clear();
    }
}

/// Resolve the projection for scanning `index` of `table`.
///
/// The returned projection comes from `pool` and is fully hydrated. On any
/// failure the instance goes back to the pool and the error is returned.
pub fn resolve_projection(
    pool: &ObjectPool<ColumnProjection>,
    table: &Arc<TableDescriptor>,
    index: &IndexDescriptor,
    inverted_column: Option<&Arc<ColumnDescriptor>>,
    visibility: ScanVisibility,
    has_system_columns: bool,
    resolver: &dyn TypeResolver,
) -> Result<ColumnProjection> {
    let mut proj = pool.acquire();
    match populate(
        &mut proj,
        table,
        index,
        inverted_column,
        visibility,
        has_system_columns,
        resolver,
    ) {
        Ok(()) => Ok(proj),
        Err(e) => {
            pool.release(proj);
            Err(e)
        }
    }
}

fn populate(
    proj: &mut ColumnProjection,
    table: &Arc<TableDescriptor>,
    index: &IndexDescriptor,
    inverted_column: Option<&Arc<ColumnDescriptor>>,
    visibility: ScanVisibility,
    has_system_columns: bool,
    resolver: &dyn TypeResolver,
) -> Result<()> {
    match visibility {
        ScanVisibility::PublicAndNotPublic => {
            proj.columns.extend(table.readable_columns().cloned());
        }
        ScanVisibility::Public => {
            proj.columns.extend(table.public_columns().cloned());
        }
    }
    if let Some(inv) = inverted_column {
        // Replace the base column in place; position and identity are
        // preserved, the type becomes the inverted encoding's type.
        if let Some(pos) = proj.columns.iter().position(|c| c.id == inv.id) {
            proj.columns[pos] = Arc::clone(inv);
        }
    }
    if has_system_columns {
        proj.columns.extend(table.system_columns().cloned());
    }

    proj.table = Some(Arc::clone(table));
    proj.index = Some(index.id);
    proj.is_secondary_index = !index.primary;

    proj.col_idx_map.reserve(proj.columns.len());
    for (ord, col) in proj.columns.iter().enumerate() {
        proj.col_idx_map.insert(col.id, ord);
    }

    proj.types.extend(proj.columns.iter().map(|c| c.typ));
    // Descriptor types may reference user-defined types; the fetch engine
    // needs them concrete before the first batch.
    resolver.hydrate_type_slice(&mut proj.types)?;

    proj.check_invariants()
}

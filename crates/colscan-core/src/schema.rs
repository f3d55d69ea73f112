//! Logical column types and the hydration contract.
//!
//! Catalog descriptors may reference user-defined types by id. Before a
//! projection is usable by the fetch engine, every such reference must be
//! hydrated (resolved to a concrete builtin type) through the query's
//! `TypeResolver`. Hydration failure is a reportable error, not a panic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::UserTypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float32,
    Float64,
    Utf8,
    Binary,
    Date64,
    Decimal128,
}

/// A column's logical type as recorded in the catalog: either a concrete
/// builtin type or an unresolved reference to a user-defined type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Builtin(DataType),
    Unresolved(UserTypeId),
}

impl ColumnType {
    pub fn is_hydrated(&self) -> bool {
        matches!(self, ColumnType::Builtin(_))
    }

    /// The concrete type, if hydrated.
    pub fn builtin(&self) -> Option<DataType> {
        match self {
            ColumnType::Builtin(dt) => Some(*dt),
            ColumnType::Unresolved(_) => None,
        }
    }
}

/// Resolves user-defined type references against the query's catalog state.
pub trait TypeResolver {
    fn resolve(&self, id: UserTypeId) -> Result<DataType>;

    /// Hydrate every unresolved entry of `types` in place.
    fn hydrate_type_slice(&self, types: &mut [ColumnType]) -> Result<()> {
        for t in types.iter_mut() {
            if let ColumnType::Unresolved(id) = *t {
                *t = ColumnType::Builtin(self.resolve(id)?);
            }
        }
        Ok(())
    }
}

/// Map-backed resolver for local execution and tests.
#[derive(Debug, Default)]
pub struct StaticTypeResolver {
    types: BTreeMap<UserTypeId, DataType>,
}

impl StaticTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: UserTypeId, dt: DataType) {
        self.types.insert(id, dt);
    }
}

impl TypeResolver for StaticTypeResolver {
    fn resolve(&self, id: UserTypeId) -> Result<DataType> {
        self.types
            .get(&id)
            .copied()
            .ok_or_else(|| Error::Hydration(format!("unknown user-defined type {id}")))
    }
}

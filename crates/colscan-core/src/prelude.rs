//! Convenient re-exports for downstream crates.

pub use crate::batch::{Batch, Column, Scalar};
pub use crate::catalog::{ColumnDescriptor, ColumnVisibility, IndexDescriptor, TableDescriptor};
pub use crate::config::ScanConfig;
pub use crate::error::{Error, Result};
pub use crate::id::{ColumnId, IndexId, NodeId, RangeId, TableId, UserTypeId};
pub use crate::schema::{ColumnType, DataType, StaticTypeResolver, TypeResolver};
pub use crate::span::{validate_spans, Key, Span, SpanSet};
pub use crate::time::Timestamp;

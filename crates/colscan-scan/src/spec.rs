//! Scan specification: the immutable construction input for a `BatchScan`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use colscan_core::catalog::TableDescriptor;
use colscan_core::error::Result;
use colscan_core::id::ColumnId;
use colscan_core::span::{validate_spans, Span};
use colscan_core::time::Timestamp;
use colscan_kv::{LockStrength, LockWaitPolicy};

/// Which column sets the scan materializes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanVisibility {
    /// Public columns only.
    #[default]
    Public,
    /// Public plus in-progress mutation columns.
    PublicAndNotPublic,
}

/// AS OF SYSTEM TIME parameters requesting a bounded-staleness read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessSpec {
    pub timestamp: Timestamp,
    /// Only the nearest replica may serve the read.
    pub nearest_only: bool,
    pub max_timestamp_bound: Option<Timestamp>,
}

/// Everything needed to construct a scan operator. Immutable once built; the
/// operator copies what it keeps (notably the spans) rather than aliasing.
#[derive(Clone)]
pub struct ScanSpec {
    pub table: Arc<TableDescriptor>,
    /// Ordinal into the table's active indexes.
    pub index_ordinal: usize,
    /// Non-overlapping spans in ascending key order.
    pub spans: Vec<Span>,
    /// Substitute this column's inverted variant into the projection.
    pub inverted_column: Option<ColumnId>,
    pub visibility: ScanVisibility,
    pub has_system_columns: bool,
    /// Ordinals (into the resolved projection) the scan must materialize.
    pub needed_columns: Vec<usize>,

    /// Soft row-count hint; 0 means none.
    pub limit_hint: u64,
    /// Explicit per-batch byte limit; 0 means use the config default.
    pub batch_bytes_limit: u64,
    /// Allow the fetch layer to issue span reads in parallel. Force-disabled
    /// whenever a row or byte limit is present, since a parallel scan cannot
    /// honor a global cap deterministically.
    pub parallelize: bool,

    pub lock_strength: LockStrength,
    pub lock_wait_policy: LockWaitPolicy,
    pub lock_timeout: Option<Duration>,

    pub staleness: Option<StalenessSpec>,
    pub reverse: bool,
    pub estimated_row_count: u64,
    /// Consistency-check scans are a row-engine feature; this operator
    /// rejects them at construction.
    pub is_check: bool,
}

impl ScanSpec {
    pub fn new(table: Arc<TableDescriptor>, spans: Vec<Span>) -> Self {
        Self {
            table,
            index_ordinal: 0,
            spans,
            inverted_column: None,
            visibility: ScanVisibility::default(),
            has_system_columns: false,
            needed_columns: Vec::new(),
            limit_hint: 0,
            batch_bytes_limit: 0,
            parallelize: false,
            lock_strength: LockStrength::default(),
            lock_wait_policy: LockWaitPolicy::default(),
            lock_timeout: None,
            staleness: None,
            reverse: false,
            estimated_row_count: 0,
            is_check: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_spans(&self.spans)
    }
}

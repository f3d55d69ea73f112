//! Bounded-staleness read header.

use serde::{Deserialize, Serialize};

use colscan_core::time::Timestamp;

/// Permits the store to serve the read from a snapshot anywhere inside a
/// time window instead of at one fixed timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedStalenessHeader {
    /// Oldest snapshot the read may observe. The scan constructor raises
    /// this to the table's modification time so the data always matches the
    /// schema being scanned.
    pub min_timestamp_bound: Timestamp,
    /// If set, only the nearest replica may serve the read.
    pub min_timestamp_bound_strict: bool,
    /// Optional upper bound on the snapshot; empty means "now".
    pub max_timestamp_bound: Option<Timestamp>,
}

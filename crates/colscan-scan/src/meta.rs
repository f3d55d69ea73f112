//! Trailing control metadata drained by the execution framework.
//!
//! Item ordering is a contract with the consumer: misplanned ranges, then
//! leaf-transaction final state, then metrics, then trace data. Steps with
//! nothing to report are omitted entirely, never emitted empty.

use serde::{Deserialize, Serialize};

use colscan_kv::{LeafTxnFinalState, RangeInfo};

/// Instantaneous metrics snapshot included in trailing metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub bytes_read: u64,
    pub rows_read: u64,
}

/// Recording of the operator's tracing span, forwarded to the coordinator
/// when tracing was active for the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceData {
    pub operator: &'static str,
    pub contention_nanos: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProducerMetadata {
    Ranges(Vec<RangeInfo>),
    LeafTxnFinalState(LeafTxnFinalState),
    Metrics(QueryMetrics),
    TraceData(TraceData),
}

#![forbid(unsafe_code)]
//! colscan-scan: the leaf scan operator of the execution engine.
//!
//! Turns a set of key-range requests against the transactional KV store
//! into a pull-based sequence of columnar batches, with strict resource
//! hygiene: pooled operator/projection/fetch-engine instances, budget-
//! accounted span copies, and trailing control metadata for the distributed
//! execution framework.
//!
//! Design intent:
//! - The operator is driven by a single caller (Init -> Next* -> DrainMeta?
//!   -> Close -> Release); only the metrics surface is safe to read from
//!   another thread.
//! - Pooled objects move by value through `ObjectPool`, so double-release
//!   and use-after-release are unrepresentable.

pub mod context;
pub mod fetch;
pub mod meta;
pub mod metrics;
pub mod operator;
pub mod pool;
pub mod projection;
pub mod spec;

pub use context::FlowContext;
pub use fetch::{local_scan_pools, FetcherArgs, KvRowFetcher, RowFetchEngine};
pub use meta::{ProducerMetadata, QueryMetrics, TraceData};
pub use metrics::{ScanMetrics, ScanStats};
pub use operator::{new_batch_scan, BatchScan, ClosableOperator, KvReader, MetadataSource};
pub use pool::{ObjectPool, Poolable, ScanPools};
pub use projection::{resolve_projection, ColumnProjection};
pub use spec::{ScanSpec, ScanVisibility, StalenessSpec};

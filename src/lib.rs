//! colscan: columnar batch scans over a distributed, transactional KV store.
//!
//! Umbrella crate re-exporting the workspace members. The interesting entry
//! points are [`colscan_scan::new_batch_scan`] and the lifecycle methods on
//! [`colscan_scan::BatchScan`].

pub use colscan_core as core;
pub use colscan_kv as kv;
pub use colscan_mem as mem;
pub use colscan_scan as scan;

//! Shared scan metrics.
//!
//! A `ScanMetrics` handle is cloned between the operator, its fetch engine,
//! and any progress watcher on another thread. Rows-read sits behind a
//! mutex (the operator's single short critical section); the byte/KV
//! counters are atomics updated by the fetch engine on its own path. All
//! readings are monotonically non-decreasing snapshots.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Aggregated low-level scan statistics, as reported in trailing metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub num_batches: u64,
    pub num_kv_pairs_read: u64,
    pub bytes_read: u64,
}

#[derive(Debug, Default)]
struct MetricsInner {
    rows_read: Mutex<u64>,
    bytes_read: AtomicU64,
    kv_pairs_read: AtomicU64,
    batches: AtomicU64,
    contention_nanos: AtomicU64,
}

#[derive(Debug, Clone, Default)]
pub struct ScanMetrics {
    inner: Arc<MetricsInner>,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `rows` to the rows-read counter. Called once per batch from
    /// `Next`; keep the critical section to exactly this.
    pub fn record_rows(&self, rows: u64) {
        let mut guard = self
            .inner
            .rows_read
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += rows;
    }

    pub fn add_bytes(&self, bytes: u64) {
        self.inner.bytes_read.fetch_add(bytes, Ordering::AcqRel);
    }

    pub fn add_kv_pairs(&self, pairs: u64) {
        self.inner.kv_pairs_read.fetch_add(pairs, Ordering::AcqRel);
    }

    pub fn add_batch(&self) {
        self.inner.batches.fetch_add(1, Ordering::AcqRel);
    }

    pub fn add_contention(&self, d: Duration) {
        self.inner
            .contention_nanos
            .fetch_add(d.as_nanos() as u64, Ordering::AcqRel);
    }

    pub fn rows_read(&self) -> u64 {
        *self
            .inner
            .rows_read
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn bytes_read(&self) -> u64 {
        self.inner.bytes_read.load(Ordering::Acquire)
    }

    pub fn cumulative_contention_time(&self) -> Duration {
        Duration::from_nanos(self.inner.contention_nanos.load(Ordering::Acquire))
    }

    pub fn scan_stats(&self) -> ScanStats {
        ScanStats {
            num_batches: self.inner.batches.load(Ordering::Acquire),
            num_kv_pairs_read: self.inner.kv_pairs_read.load(Ordering::Acquire),
            bytes_read: self.bytes_read(),
        }
    }
}

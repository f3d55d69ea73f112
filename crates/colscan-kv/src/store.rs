//! Ordered in-memory KV store.
//!
//! Backs the reference row-fetch engine and the test suites. Values are
//! opaque bytes to the store; the fetch engine encodes rows as JSON scalar
//! lists. Keys iterate in ascending order, matching the distributed store's
//! ordered key space.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use colscan_core::batch::Scalar;
use colscan_core::error::{Error, Result};
use colscan_core::span::{Key, Span};

#[derive(Debug, Default)]
pub struct MemKv {
    data: RwLock<BTreeMap<Key, Vec<u8>>>,
}

impl MemKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: impl Into<Key>, value: Vec<u8>) {
        let mut data = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        data.insert(key.into(), value);
    }

    /// Encode `row` as the store's value format and write it under `key`.
    pub fn put_row(&self, key: impl Into<Key>, row: &[Scalar]) -> Result<()> {
        let value = serde_json::to_vec(row).map_err(|e| Error::Scan(e.to_string()))?;
        self.put(key, value);
        Ok(())
    }

    /// Decode a value previously written by `put_row`.
    pub fn decode_row(value: &[u8]) -> Result<Vec<Scalar>> {
        serde_json::from_slice(value).map_err(|e| Error::Scan(e.to_string()))
    }

    /// Up to `max_pairs` key/value pairs inside `span`, in ascending key
    /// order, starting strictly after `resume_after` when given.
    pub fn scan_from(
        &self,
        span: &Span,
        resume_after: Option<&[u8]>,
        max_pairs: usize,
    ) -> Vec<(Key, Vec<u8>)> {
        self.scan_from_timed(span, resume_after, max_pairs).0
    }

    /// Like `scan_from`, but also reports how long the caller waited to
    /// acquire the store's read lock. Writers hold the lock exclusively, so
    /// this wait is the scan's contention with concurrent mutations.
    pub fn scan_from_timed(
        &self,
        span: &Span,
        resume_after: Option<&[u8]>,
        max_pairs: usize,
    ) -> (Vec<(Key, Vec<u8>)>, Duration) {
        let lock_start = Instant::now();
        let data = self
            .data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let lock_wait = lock_start.elapsed();
        let lower = match resume_after {
            Some(k) if k >= span.start.as_slice() => Bound::Excluded(k.to_vec()),
            _ => Bound::Included(span.start.clone()),
        };
        let pairs = data
            .range((lower, Bound::Excluded(span.end.clone())))
            .take(max_pairs)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        (pairs, lock_wait)
    }

    pub fn len(&self) -> usize {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

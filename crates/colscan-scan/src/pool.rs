//! Pooled-object lifecycle: acquire / reset / release.
//!
//! Scan operators, projections, and fetch engines are allocated per query at
//! high churn; the pools amortize that. Objects move by value: `acquire`
//! hands out exclusive ownership, `release` is the only way back in and
//! consumes the object, so a double release or use-after-release does not
//! typecheck.

use std::sync::Mutex;

/// An object that can live in an `ObjectPool`.
///
/// `reset` must be total: every query-scoped field is cleared down to length
/// zero (slice-backed fields keep their capacity so reuse amortizes
/// allocation). A freshly `Default`ed instance and a reset one must be
/// indistinguishable to the next owner.
pub trait Poolable: Default + Send {
    fn reset(&mut self);
}

/// Unbounded free-list pool. Process-wide instances are expected to be
/// shared across concurrently executing queries; the internal mutex makes
/// acquire/release race-free without caller-side locking.
pub struct ObjectPool<T: Poolable> {
    slots: Mutex<Vec<T>>,
}

impl<T: Poolable> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
        }
    }

    /// A reset pooled instance, or a fresh default one if the pool is empty.
    /// The caller must not assume any field holds capacity or data beyond
    /// what `reset` guarantees.
    pub fn acquire(&self) -> T {
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.pop().unwrap_or_default()
    }

    /// Return `obj` to the pool. Resets it first so no query-scoped state
    /// leaks to the next owner.
    pub fn release(&self, mut obj: T) {
        obj.reset();
        let mut slots = self
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        slots.push(obj);
    }

    /// Number of idle instances (advisory; for tests and introspection).
    pub fn idle(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

/// The three pools a scan flavor needs, grouped so they can be injected as
/// one explicit shared service (tests substitute isolated sets per run).
pub struct ScanPools<F>
where
    F: crate::fetch::RowFetchEngine + Poolable,
{
    pub operators: ObjectPool<crate::operator::BatchScan<F>>,
    pub fetchers: ObjectPool<F>,
    pub projections: ObjectPool<crate::projection::ColumnProjection>,
}

impl<F> Default for ScanPools<F>
where
    F: crate::fetch::RowFetchEngine + Poolable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<F> ScanPools<F>
where
    F: crate::fetch::RowFetchEngine + Poolable,
{
    pub fn new() -> Self {
        Self {
            operators: ObjectPool::new(),
            fetchers: ObjectPool::new(),
            projections: ObjectPool::new(),
        }
    }
}

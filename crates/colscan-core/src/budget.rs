//! Abstract memory budget interfaces.
//!
//! The concrete implementation lives in `colscan-mem`. We keep only traits
//! here so any crate can depend on the API without pulling the allocator.
//! The scan operator charges its span-copy memory against a budget; the
//! guard's drop reverses the charge when the operator is released, so pooled
//! reuse never leaks budget.

/// A guard returned by a memory budget when bytes are acquired.
///
/// The concrete type lives in `colscan-mem`. It must be RAII (releases on
/// Drop), `Send`, and panic-safe.
pub trait BudgetGuard: Send {
    /// Number of bytes currently accounted for by this guard.
    fn bytes(&self) -> usize;
    /// Optional debug tag for metrics/tracing.
    fn tag(&self) -> &'static str {
        "guard"
    }
}

/// A handle representing a memory-cap enforcer.
///
/// Implemented by `colscan-mem`. The operator constructor calls
/// `try_acquire` before copying spans. If `None` is returned, construction
/// fails with a budget error rather than allocating past the cap.
pub trait MemoryBudget: Send + Sync + 'static {
    type Guard: BudgetGuard;

    /// Attempt to acquire `bytes` from the live budget. Returns a guard on
    /// success.
    fn try_acquire(&self, bytes: usize, tag: &'static str) -> Option<Self::Guard>;

    /// Total configured capacity (bytes).
    fn capacity_bytes(&self) -> usize;

    /// Approximate currently used bytes (advisory; not a correctness API).
    fn used_bytes(&self) -> usize;
}

// NOTE: Do *not* add default impls here that would silently "allow"
// allocations. The mem crate is the only place where guards are constructed.

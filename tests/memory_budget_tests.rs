//! Memory budget enforcement tests

use std::sync::Arc;
use std::thread;

use colscan_core::budget::{BudgetGuard, MemoryBudget};
use colscan_mem::MemoryBudgetImpl;

#[test]
fn test_budget_acquire_release() {
    let budget = MemoryBudgetImpl::new(1024 * 1024); // 1MB

    // Initially no memory used
    assert_eq!(budget.used_bytes(), 0);

    // Acquire 100KB
    let guard = budget
        .try_acquire(100 * 1024, "test")
        .expect("Acquire failed");
    assert_eq!(budget.used_bytes(), 100 * 1024);
    assert_eq!(guard.bytes(), 100 * 1024);
    assert_eq!(guard.tag(), "test");

    // Release explicitly
    drop(guard);
    assert_eq!(budget.used_bytes(), 0);
}

#[test]
fn test_budget_exhaustion() {
    let budget = MemoryBudgetImpl::new(500 * 1024); // 500KB

    let guard1 = budget
        .try_acquire(400 * 1024, "test")
        .expect("First acquire failed");
    assert_eq!(budget.used_bytes(), 400 * 1024);

    // Another 200KB would exceed the cap.
    let result = budget.try_acquire(200 * 1024, "test");
    assert!(result.is_none(), "Should fail to acquire beyond capacity");
    assert_eq!(budget.used_bytes(), 400 * 1024);

    drop(guard1);
    assert_eq!(budget.used_bytes(), 0);

    let guard2 = budget
        .try_acquire(200 * 1024, "test")
        .expect("Acquire after release failed");
    assert_eq!(budget.used_bytes(), 200 * 1024);
    drop(guard2);
}

#[test]
fn test_budget_peak_tracking() {
    let budget = MemoryBudgetImpl::new(1024 * 1024);
    assert_eq!(budget.peak_bytes(), 0);

    let g1 = budget.try_acquire(300 * 1024, "a").expect("acquire");
    let g2 = budget.try_acquire(200 * 1024, "b").expect("acquire");
    drop(g1);
    drop(g2);

    // Usage went back to zero but the high-water mark persists.
    assert_eq!(budget.used_bytes(), 0);
    assert_eq!(budget.peak_bytes(), 500 * 1024);
}

#[test]
fn test_guard_resize() {
    let budget = MemoryBudgetImpl::new(100);

    let mut guard = budget.try_acquire(40, "resize").expect("acquire");

    // Grow within capacity.
    assert!(guard.try_resize(90));
    assert_eq!(budget.used_bytes(), 90);

    // Grow past capacity fails and leaves the guard unchanged.
    assert!(!guard.try_resize(200));
    assert_eq!(guard.bytes(), 90);

    // Shrink always succeeds.
    assert!(guard.try_resize(10));
    assert_eq!(budget.used_bytes(), 10);

    drop(guard);
    assert_eq!(budget.used_bytes(), 0);
}

#[test]
fn test_zero_byte_guard_is_free() {
    let budget = MemoryBudgetImpl::new(16);
    let guard = budget.try_acquire(0, "zero").expect("zero acquire");
    assert_eq!(guard.bytes(), 0);
    assert_eq!(budget.used_bytes(), 0);
}

#[test]
fn test_concurrent_acquire_release() {
    let budget = Arc::new(MemoryBudgetImpl::new(1024 * 1024));
    let mut handles = Vec::new();

    for _ in 0..8 {
        let budget = Arc::clone(&budget);
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                if let Some(guard) = budget.try_acquire(4 * 1024, "worker") {
                    assert!(budget.used_bytes() >= guard.bytes());
                    drop(guard);
                }
            }
        }));
    }
    for h in handles {
        h.join().expect("worker panicked");
    }

    // Every guard dropped: the budget must be whole again.
    assert_eq!(budget.used_bytes(), 0);
    assert!(budget.peak_bytes() <= budget.capacity_bytes());
}

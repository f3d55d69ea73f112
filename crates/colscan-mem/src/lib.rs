//! colscan-mem: the concrete memory budget.
//!
//! Every operator-scoped allocation that must respect the query's memory cap
//! (span copies, fetch-engine working buffers) acquires a guard here first.
//! Dropping the guard returns the bytes to the budget (panic-safe), so a
//! released operator can never leak accounted memory.

pub mod error;
pub mod guard;

pub use error::{Error, Result};
pub use guard::{BudgetGuardImpl, MemoryBudgetImpl};

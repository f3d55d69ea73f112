//! colscan-kv: the scan operator's external collaborators.
//!
//! The operator treats everything here as a fixed contract: transaction
//! handles (root and leaf, with leaf final-state reporting), the range cache
//! used for misplanned-range detection, locking policy types, the bounded
//! staleness header, and an ordered in-memory store that backs the reference
//! row-fetch engine and the test suites.

pub mod locking;
pub mod range_cache;
pub mod staleness;
pub mod store;
pub mod txn;

pub use locking::{LockStrength, LockWaitPolicy};
pub use range_cache::{RangeCache, RangeInfo};
pub use staleness::BoundedStalenessHeader;
pub use store::MemKv;
pub use txn::{LeafTxnFinalState, Txn, TxnKind};

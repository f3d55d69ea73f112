//! Row-level locking policy carried by a scan specification.

use serde::{Deserialize, Serialize};

/// Strength of the locks taken on rows as they are scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockStrength {
    /// Plain reads; no locks.
    #[default]
    None,
    ForShare,
    ForUpdate,
}

/// What to do when a scanned row is already locked by another transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockWaitPolicy {
    /// Queue behind the conflicting transaction.
    #[default]
    Block,
    /// Fail the scan with a locking conflict.
    Error,
    /// Skip rows that cannot be locked immediately.
    SkipLocked,
}

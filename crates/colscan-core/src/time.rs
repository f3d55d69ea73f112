//! Logical timestamps for snapshot and bounded-staleness reads.

use serde::{Deserialize, Serialize};

/// A hybrid logical timestamp as handed out by the KV layer. Total order:
/// wall clock first, logical tiebreaker second. The default value is "empty"
/// and sorts before every real timestamp.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub wall_nanos: i64,
    pub logical: u32,
}

impl Timestamp {
    pub const fn new(wall_nanos: i64, logical: u32) -> Self {
        Self { wall_nanos, logical }
    }

    pub fn is_empty(&self) -> bool {
        self.wall_nanos == 0 && self.logical == 0
    }
}

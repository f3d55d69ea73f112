//! Strongly-typed identifiers used across the engine.
//!
//! Downstream crates (kv, scan, etc.) should *not* use raw integers for IDs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! new_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(TableId);
new_id!(IndexId);
new_id!(ColumnId);
new_id!(NodeId);
new_id!(RangeId);
new_id!(UserTypeId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types_with_stable_display() {
        let t = TableId::new(7);
        assert_eq!(t.get(), 7);
        assert_eq!(t.to_string(), "TableId(7)");
        assert_eq!(NodeId::new(0).get(), 0);
    }
}

//! Range cache: where each key range's leaseholder currently lives.
//!
//! Distributed planning pins a scan to the node believed to hold its ranges.
//! By execution time some ranges may have moved; the operator reports those
//! "misplanned" ranges back to the coordinator at drain so the plan can be
//! corrected for subsequent queries.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use colscan_core::id::{NodeId, RangeId};
use colscan_core::span::Span;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeInfo {
    pub range_id: RangeId,
    pub span: Span,
    pub lease_holder: NodeId,
}

#[derive(Debug, Default)]
pub struct RangeCache {
    // Ordered by span start; ranges never overlap.
    entries: RwLock<Vec<RangeInfo>>,
}

impl RangeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, info: RangeInfo) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push(info);
        entries.sort_by(|a, b| a.span.start.cmp(&b.span.start));
    }

    /// The ranges overlapping `spans` whose leaseholder is not `local`.
    /// Returns `None` when every overlapping range is local, so callers can
    /// omit the metadata item entirely.
    pub fn misplanned_ranges(&self, spans: &[Span], local: NodeId) -> Option<Vec<RangeInfo>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut misplanned = Vec::new();
        for info in entries.iter() {
            if info.lease_holder == local {
                continue;
            }
            if spans.iter().any(|sp| sp.overlaps(&info.span)) {
                misplanned.push(info.clone());
            }
        }
        if misplanned.is_empty() {
            None
        } else {
            Some(misplanned)
        }
    }
}

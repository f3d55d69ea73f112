//! Key spans over the ordered key space of the distributed store.
//!
//! A `Span` is half-open `[start, end)`. Scan specifications carry a set of
//! spans that must be non-overlapping and strictly ascending; `SpanSet` is
//! the operator-owned copy of them (plus an immutable duplicate retained on
//! distributed flows for misplanned-range reporting).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type Key = Vec<u8>;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: Key,
    pub end: Key,
}

impl Span {
    pub fn new(start: impl Into<Key>, end: impl Into<Key>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// True if `key` falls inside `[start, end)`.
    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && key < self.end.as_slice()
    }

    /// True if the two spans share at least one key.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Heap bytes held by this span's keys (used for budget accounting).
    pub fn mem_usage(&self) -> usize {
        self.start.capacity() + self.end.capacity()
    }
}

/// Validate that `spans` are individually non-empty and collectively
/// non-overlapping in ascending key order.
pub fn validate_spans(spans: &[Span]) -> Result<()> {
    for (i, sp) in spans.iter().enumerate() {
        if sp.start >= sp.end {
            return Err(Error::Spec(format!(
                "span {} is empty or inverted ({:?} >= {:?})",
                i, sp.start, sp.end
            )));
        }
        if i > 0 && spans[i - 1].end > sp.start {
            return Err(Error::Spec(format!(
                "spans {} and {} overlap or are out of order",
                i - 1,
                i
            )));
        }
    }
    Ok(())
}

/// Heap bytes held by a slice of spans.
pub fn spans_mem_usage(spans: &[Span]) -> usize {
    spans.iter().map(Span::mem_usage).sum()
}

/// Operator-owned spans plus an optional immutable copy.
///
/// The copy exists so that misplanned-range reporting at drain time can use
/// the original spans even though the fetch engine may have consumed or
/// mutated the primary set. `reset` deeply clears both vectors: the key
/// buffers are dropped (so no query keys are retained across pool reuse)
/// while the outer vectors keep their capacity.
#[derive(Debug, Default)]
pub struct SpanSet {
    spans: Vec<Span>,
    copy: Vec<Span>,
}

impl SpanSet {
    /// Replace the owned spans with a copy of `src`. Never aliases the
    /// caller's key memory.
    pub fn set_from(&mut self, src: &[Span]) {
        self.spans.clear();
        self.spans.extend_from_slice(src);
    }

    /// Duplicate the owned spans into the immutable copy.
    pub fn make_copy(&mut self) {
        self.copy.clear();
        self.copy.extend_from_slice(&self.spans);
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn copy(&self) -> &[Span] {
        &self.copy
    }

    pub fn has_copy(&self) -> bool {
        !self.copy.is_empty()
    }

    pub fn mem_usage(&self) -> usize {
        spans_mem_usage(&self.spans) + spans_mem_usage(&self.copy)
    }

    /// Deep reset: drop all span keys, keep the outer vectors' capacity.
    pub fn reset(&mut self) {
        self.spans.clear();
        self.copy.clear();
    }
}

//! Root and leaf transaction handles.
//!
//! A leaf transaction runs on a non-coordinating node; the reads it performs
//! must be reported back to the coordinator when the operator drains. The
//! fetch engine records each scanned span here, and `leaf_final_state`
//! surfaces the accumulated set.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use colscan_core::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnKind {
    Root,
    Leaf,
}

/// Final read state of a leaf transaction, reconciled by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafTxnFinalState {
    pub read_spans: Vec<Span>,
}

#[derive(Debug)]
pub struct Txn {
    kind: TxnKind,
    read_spans: Mutex<Vec<Span>>,
}

impl Txn {
    pub fn root() -> Self {
        Self {
            kind: TxnKind::Root,
            read_spans: Mutex::new(Vec::new()),
        }
    }

    pub fn leaf() -> Self {
        Self {
            kind: TxnKind::Leaf,
            read_spans: Mutex::new(Vec::new()),
        }
    }

    pub fn kind(&self) -> TxnKind {
        self.kind
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == TxnKind::Leaf
    }

    /// Record a span read under this transaction. Called by the fetch engine
    /// as it finishes each scanned span.
    pub fn record_read_span(&self, span: Span) {
        let mut reads = self
            .read_spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        reads.push(span);
    }

    /// `Some` only for a leaf transaction that performed at least one read;
    /// root transactions have nothing to reconcile.
    pub fn leaf_final_state(&self) -> Option<LeafTxnFinalState> {
        if !self.is_leaf() {
            return None;
        }
        let reads = self
            .read_spans
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if reads.is_empty() {
            return None;
        }
        Some(LeafTxnFinalState {
            read_spans: reads.clone(),
        })
    }
}

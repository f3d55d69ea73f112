//! The row-fetch engine contract and the in-memory reference engine.
//!
//! The operator only ever sees the `RowFetchEngine` trait: configure against
//! a projection, start a scan over spans, pull batches, report bytes read,
//! close. `KvRowFetcher` implements it over the ordered in-memory store; the
//! real distributed fetcher plugs in behind the same trait.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::trace;

use colscan_core::batch::{Batch, Column, Scalar};
use colscan_core::error::{Error, Result};
use colscan_core::schema::ColumnType;
use colscan_core::span::{Key, Span};
use colscan_kv::{BoundedStalenessHeader, LockStrength, LockWaitPolicy, MemKv, Txn};

use crate::context::FlowContext;
use crate::metrics::ScanMetrics;
use crate::pool::{Poolable, ScanPools};
use crate::projection::ColumnProjection;

/// Production batch row capacity.
const DEFAULT_BATCH_ROWS: usize = 1024;

/// Per-scan engine parameters, fixed at operator construction.
#[derive(Debug, Clone, Default)]
pub struct FetcherArgs {
    pub lock_strength: LockStrength,
    pub lock_wait_policy: LockWaitPolicy,
    pub lock_timeout: Option<Duration>,
    /// Working-memory cap for engine-side buffering. The in-memory engine
    /// holds no spill buffers; only the distributed engine consumes this.
    pub work_mem_bytes: usize,
    /// Planner's row-count estimate; sizes the first batch's columns so a
    /// well-estimated scan never regrows them.
    pub estimated_row_count: u64,
    pub reverse: bool,
    pub trace_kv: bool,
}

/// The scan operator's view of the engine that performs the actual KV reads
/// and decodes raw pairs into typed columns.
pub trait RowFetchEngine: Send + 'static {
    /// Configure the engine for one scan: copy what it needs out of the
    /// projection and hold the shared metrics handle.
    fn init(
        &mut self,
        ctx: &FlowContext,
        projection: &ColumnProjection,
        metrics: ScanMetrics,
        args: FetcherArgs,
    ) -> Result<()>;

    /// Start the scan over `spans` under `txn`.
    #[allow(clippy::too_many_arguments)]
    fn start_scan(
        &mut self,
        txn: Arc<Txn>,
        spans: &[Span],
        bs_header: Option<&BoundedStalenessHeader>,
        limit_batches: bool,
        batch_bytes_limit: u64,
        row_limit_hint: u64,
        force_production_batch_sizes: bool,
    ) -> Result<()>;

    /// The next batch; zero-length means the scan is exhausted. Must never
    /// attach a selection vector.
    fn next_batch(&mut self) -> Result<Batch>;

    /// Total bytes read so far (monotonic snapshot).
    fn bytes_read(&self) -> u64;

    /// Release scan-scoped resources. Idempotent.
    fn close(&mut self);
}

/// Reference engine over the in-memory ordered store.
#[derive(Debug, Default)]
pub struct KvRowFetcher {
    store: Option<Arc<MemKv>>,
    txn: Option<Arc<Txn>>,
    metrics: ScanMetrics,
    args: FetcherArgs,

    // Projection copy: names/types aligned by ordinal, `needed` as a mask.
    col_names: Vec<String>,
    types: Vec<ColumnType>,
    needed: Vec<bool>,

    // Scan state.
    spans: Vec<Span>,
    limit_batches: bool,
    batch_bytes_limit: u64,
    max_batch_rows: usize,
    span_idx: usize,
    resume_after: Option<Key>,
    pending: VecDeque<(Key, Vec<u8>)>,
    started: bool,
}

impl KvRowFetcher {
    /// Pull the next ascending chunk for the current span into `pending`.
    /// Returns false once the span is exhausted.
    fn fill_pending(&mut self, span: &Span, want: usize) -> Result<bool> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| Error::Internal("fetcher used before init".into()))?;
        if self.args.reverse {
            // Reverse scans buffer the whole span once, then drain backwards.
            if self.resume_after.is_some() {
                return Ok(false);
            }
            let (mut pairs, lock_wait) = store.scan_from_timed(span, None, usize::MAX);
            self.metrics.add_contention(lock_wait);
            pairs.reverse();
            self.pending.extend(pairs);
            self.resume_after = Some(span.end.clone());
            return Ok(!self.pending.is_empty());
        }
        let (pairs, lock_wait) =
            store.scan_from_timed(span, self.resume_after.as_deref(), want);
        self.metrics.add_contention(lock_wait);
        if pairs.is_empty() {
            return Ok(false);
        }
        if let Some((last_key, _)) = pairs.last() {
            self.resume_after = Some(last_key.clone());
        }
        self.pending.extend(pairs);
        Ok(true)
    }

    fn decode_into(&self, value: &[u8], columns: &mut [Column]) -> Result<()> {
        let row = MemKv::decode_row(value)?;
        for (ord, col) in columns.iter_mut().enumerate() {
            let v = if self.needed[ord] {
                row.get(ord).cloned().unwrap_or(Scalar::Null)
            } else {
                Scalar::Null
            };
            col.values.push(v);
        }
        Ok(())
    }

    fn finish_span(&mut self) {
        if let (Some(txn), Some(span)) = (self.txn.as_ref(), self.spans.get(self.span_idx)) {
            txn.record_read_span(span.clone());
        }
        self.span_idx += 1;
        self.resume_after = None;
    }
}

impl RowFetchEngine for KvRowFetcher {
    fn init(
        &mut self,
        ctx: &FlowContext,
        projection: &ColumnProjection,
        metrics: ScanMetrics,
        args: FetcherArgs,
    ) -> Result<()> {
        projection.check_invariants()?;
        self.store = Some(Arc::clone(&ctx.store));
        self.metrics = metrics;
        self.args = args;

        self.col_names.clear();
        self.col_names
            .extend(projection.columns.iter().map(|c| c.name.clone()));
        self.types.clear();
        self.types.extend_from_slice(&projection.types);
        if let Some(t) = self.types.iter().find(|t| !t.is_hydrated()) {
            return Err(Error::Internal(format!(
                "fetcher initialized with unhydrated type {t:?}"
            )));
        }
        self.needed.clear();
        self.needed.resize(projection.num_columns(), false);
        for &ord in &projection.needed {
            self.needed[ord] = true;
        }
        Ok(())
    }

    fn start_scan(
        &mut self,
        txn: Arc<Txn>,
        spans: &[Span],
        bs_header: Option<&BoundedStalenessHeader>,
        limit_batches: bool,
        batch_bytes_limit: u64,
        row_limit_hint: u64,
        force_production_batch_sizes: bool,
    ) -> Result<()> {
        if let Some(header) = bs_header {
            if let Some(max) = header.max_timestamp_bound {
                if max < header.min_timestamp_bound {
                    return Err(Error::Scan(format!(
                        "bounded staleness window is inverted: min {:?} > max {:?}",
                        header.min_timestamp_bound, max
                    )));
                }
            }
        }
        self.txn = Some(txn);
        self.spans.clear();
        if self.args.reverse {
            // A reverse scan walks the spans last to first so that, combined
            // with the per-span backwards drain, rows come out globally
            // descending.
            self.spans.extend(spans.iter().rev().cloned());
        } else {
            self.spans.extend_from_slice(spans);
        }
        self.limit_batches = limit_batches;
        self.batch_bytes_limit = batch_bytes_limit;
        self.max_batch_rows = if !force_production_batch_sizes && row_limit_hint > 0 {
            (row_limit_hint as usize).min(DEFAULT_BATCH_ROWS)
        } else {
            DEFAULT_BATCH_ROWS
        };
        self.span_idx = 0;
        self.resume_after = None;
        self.pending.clear();
        self.started = true;
        Ok(())
    }

    fn next_batch(&mut self) -> Result<Batch> {
        if !self.started {
            return Err(Error::Internal("next_batch called before start_scan".into()));
        }

        // Size the columns from the planner's estimate; without one they
        // grow organically.
        let row_capacity = (self.args.estimated_row_count as usize).min(self.max_batch_rows);
        let mut columns: Vec<Column> = self
            .col_names
            .iter()
            .map(|name| Column::with_capacity(name.clone(), row_capacity))
            .collect();
        let mut rows = 0usize;
        let mut batch_bytes = 0u64;

        'spans: while self.span_idx < self.spans.len() {
            if self.pending.is_empty() {
                let span = self.spans[self.span_idx].clone();
                let want = self.max_batch_rows - rows;
                if !self.fill_pending(&span, want.max(1))? {
                    self.finish_span();
                    continue;
                }
            }
            while let Some((key, value)) = self.pending.pop_front() {
                let pair_bytes = (key.len() + value.len()) as u64;
                if self.args.trace_kv {
                    trace!(key = ?key, bytes = pair_bytes, "kv pair");
                }
                self.decode_into(&value, &mut columns)?;
                rows += 1;
                batch_bytes += pair_bytes;
                self.metrics.add_bytes(pair_bytes);
                self.metrics.add_kv_pairs(1);
                if rows >= self.max_batch_rows {
                    break 'spans;
                }
                if self.limit_batches
                    && self.batch_bytes_limit > 0
                    && batch_bytes >= self.batch_bytes_limit
                {
                    break 'spans;
                }
            }
        }

        if rows == 0 {
            return Ok(Batch::empty());
        }
        self.metrics.add_batch();
        Ok(Batch::new(columns))
    }

    fn bytes_read(&self) -> u64 {
        self.metrics.bytes_read()
    }

    fn close(&mut self) {
        // Scan-scoped state only; configuration survives until reset so the
        // operator can still answer bytes_read after close.
        self.pending.clear();
        self.started = false;
    }
}

impl Poolable for KvRowFetcher {
    fn reset(&mut self) {
        self.store = None;
        self.txn = None;
        self.metrics = ScanMetrics::default();
        self.args = FetcherArgs::default();
        self.col_names.clear();
        self.types.clear();
        self.needed.clear();
        self.spans.clear();
        self.limit_batches = false;
        self.batch_bytes_limit = 0;
        self.max_batch_rows = 0;
        self.span_idx = 0;
        self.resume_after = None;
        self.pending.clear();
        self.started = false;
    }
}

static LOCAL_SCAN_POOLS: Lazy<ScanPools<KvRowFetcher>> = Lazy::new(ScanPools::new);

/// Process-wide pool set for the reference engine. Injected explicitly into
/// constructors; tests are free to build isolated `ScanPools` instead.
pub fn local_scan_pools() -> &'static ScanPools<KvRowFetcher> {
    &LOCAL_SCAN_POOLS
}

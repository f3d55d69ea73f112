//! The `BatchScan` operator: lifecycle state machine over a row-fetch engine.
//!
//! Driven synchronously by a single caller: construct, `init` once, `next`
//! until an empty batch, optionally `drain_meta`, then `close` and
//! `release`. The only state safe to touch from another thread is the
//! metrics surface (via a cloned `ScanMetrics` handle or the `KvReader`
//! accessors).

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use colscan_core::batch::Batch;
use colscan_core::budget::MemoryBudget;
use colscan_core::error::{Error, Result};
use colscan_core::id::NodeId;
use colscan_core::schema::{ColumnType, TypeResolver};
use colscan_core::span::{spans_mem_usage, SpanSet};
use colscan_kv::{BoundedStalenessHeader, RangeCache, Txn};
use colscan_mem::{BudgetGuardImpl, MemoryBudgetImpl};

use crate::context::FlowContext;
use crate::fetch::{FetcherArgs, RowFetchEngine};
use crate::meta::{ProducerMetadata, QueryMetrics, TraceData};
use crate::metrics::{ScanMetrics, ScanStats};
use crate::pool::{Poolable, ScanPools};
use crate::projection::{resolve_projection, ColumnProjection};
use crate::spec::ScanSpec;

/// Read-side metrics capability shared by operators that perform KV scans.
pub trait KvReader {
    fn bytes_read(&self) -> u64;
    fn rows_read(&self) -> u64;
    fn cumulative_contention_time(&self) -> Duration;
    fn scan_stats(&self) -> ScanStats;
}

/// Operators owning resources that must be released before pool return.
pub trait ClosableOperator {
    fn close(&mut self) -> Result<()>;
}

/// Producers of trailing control metadata.
pub trait MetadataSource {
    fn drain_meta(&mut self) -> Vec<ProducerMetadata>;
}

#[derive(Debug)]
pub struct BatchScan<F: RowFetchEngine> {
    initialized: bool,
    span_set: SpanSet,
    bs_header: Option<BoundedStalenessHeader>,
    fetcher: Option<F>,
    projection: Option<ColumnProjection>,
    limit_hint: u64,
    batch_bytes_limit: u64,
    parallelize: bool,
    local: bool,
    node_id: Option<NodeId>,
    txn: Option<Arc<Txn>>,
    range_cache: Option<Arc<RangeCache>>,
    force_production_batch_sizes: bool,
    // Created at init when the subscriber records this level, finished
    // (dropped) at close; scopes contention and I/O events to this scan.
    tracing_span: Option<tracing::Span>,
    metrics: ScanMetrics,
    // Budget charge for the operator's span copies; dropping it on release
    // reverses the accounting.
    span_mem: Option<BudgetGuardImpl>,
    /// Column types this operator produces. Use this rather than the table's
    /// own types: the projection may substitute inverted variants or append
    /// system columns.
    pub result_types: Vec<ColumnType>,
}

impl<F: RowFetchEngine> Default for BatchScan<F> {
    fn default() -> Self {
        Self {
            initialized: false,
            span_set: SpanSet::default(),
            bs_header: None,
            fetcher: None,
            projection: None,
            limit_hint: 0,
            batch_bytes_limit: 0,
            parallelize: false,
            local: true,
            node_id: None,
            txn: None,
            range_cache: None,
            force_production_batch_sizes: false,
            tracing_span: None,
            metrics: ScanMetrics::default(),
            span_mem: None,
            result_types: Vec::new(),
        }
    }
}

impl<F: RowFetchEngine + Poolable> Poolable for BatchScan<F> {
    fn reset(&mut self) {
        self.initialized = false;
        self.span_set.reset();
        self.bs_header = None;
        self.fetcher = None;
        self.projection = None;
        self.limit_hint = 0;
        self.batch_bytes_limit = 0;
        self.parallelize = false;
        self.local = true;
        self.node_id = None;
        self.txn = None;
        self.range_cache = None;
        self.force_production_batch_sizes = false;
        self.tracing_span = None;
        self.metrics = ScanMetrics::default();
        self.span_mem = None;
        self.result_types.clear();
    }
}

/// Construct a `BatchScan` from `spec`, drawing the operator, projection,
/// and fetch engine from `pools` and charging span-copy memory to `budget`.
pub fn new_batch_scan<F: RowFetchEngine + Poolable>(
    pools: &ScanPools<F>,
    ctx: &FlowContext,
    budget: &MemoryBudgetImpl,
    resolver: &dyn TypeResolver,
    spec: &ScanSpec,
) -> Result<BatchScan<F>> {
    // A present-but-zero node id is a distributed-planning bug, not a
    // runtime condition. Absent is fine (e.g. tenant pods).
    if let Some(node_id) = ctx.node_id {
        if node_id.get() == 0 {
            return Err(Error::Spec(
                "attempting to create a batch scan with an uninitialized node id".into(),
            ));
        }
    }
    if spec.is_check {
        return Err(Error::Internal(
            "attempting to create a batch scan with the is_check flag set".into(),
        ));
    }
    spec.validate()?;

    let index = spec.table.active_index(spec.index_ordinal)?.clone();
    let inverted = spec
        .inverted_column
        .and_then(|id| spec.table.find_inverted_column(id));
    let mut projection = resolve_projection(
        &pools.projections,
        &spec.table,
        &index,
        inverted.as_ref(),
        spec.visibility,
        spec.has_system_columns,
        resolver,
    )?;
    for &ord in &spec.needed_columns {
        projection.needed.insert(ord);
    }
    if let Err(e) = projection.check_invariants() {
        pools.projections.release(projection);
        return Err(e);
    }

    let metrics = ScanMetrics::new();
    let args = FetcherArgs {
        lock_strength: spec.lock_strength,
        lock_wait_policy: spec.lock_wait_policy,
        lock_timeout: spec.lock_timeout,
        work_mem_bytes: ctx.config.work_mem_bytes,
        estimated_row_count: spec.estimated_row_count,
        reverse: spec.reverse,
        trace_kv: ctx.config.trace_kv,
    };
    let mut fetcher = pools.fetchers.acquire();
    if let Err(e) = fetcher.init(ctx, &projection, metrics.clone(), args) {
        pools.fetchers.release(fetcher);
        pools.projections.release(projection);
        return Err(e);
    }

    // Charge the spans we are about to copy (twice on distributed flows,
    // which retain an immutable duplicate for misplanned-range reporting).
    let copies = if ctx.local { 1 } else { 2 };
    let span_bytes = spans_mem_usage(&spec.spans) * copies;
    let span_mem = match budget.try_acquire(span_bytes, "scan-spans") {
        Some(guard) => guard,
        None => {
            pools.fetchers.release(fetcher);
            pools.projections.release(projection);
            return Err(colscan_mem::Error::BudgetExceeded {
                tag: "scan-spans",
                requested: span_bytes,
                capacity: budget.capacity_bytes(),
                used: budget.used_bytes(),
            }
            .into());
        }
    };

    let bs_header = spec.staleness.as_ref().map(|aost| {
        // Never read below the table's schema-change time, or the data
        // would not correspond to the descriptor being scanned.
        let min = aost.timestamp.max(spec.table.modification_time);
        BoundedStalenessHeader {
            min_timestamp_bound: min,
            min_timestamp_bound_strict: aost.nearest_only,
            max_timestamp_bound: aost.max_timestamp_bound,
        }
    });

    // A row or byte limit rules out parallelism: a parallel scan cannot
    // honor a global cap deterministically. The limit always wins.
    let mut parallelize = spec.parallelize;
    if spec.limit_hint > 0 || spec.batch_bytes_limit > 0 {
        parallelize = false;
    }
    let batch_bytes_limit = if parallelize {
        0
    } else if spec.batch_bytes_limit > 0 {
        spec.batch_bytes_limit
    } else {
        ctx.config.default_batch_bytes_limit
    };

    let mut s = pools.operators.acquire();
    s.span_set.set_from(&spec.spans);
    if !ctx.local {
        s.span_set.make_copy();
    }
    s.result_types.extend_from_slice(&projection.types);
    s.bs_header = bs_header;
    s.fetcher = Some(fetcher);
    s.projection = Some(projection);
    s.limit_hint = spec.limit_hint;
    s.batch_bytes_limit = batch_bytes_limit;
    s.parallelize = parallelize;
    s.local = ctx.local;
    s.node_id = ctx.node_id;
    s.txn = Some(Arc::clone(&ctx.txn));
    s.range_cache = Some(Arc::clone(&ctx.range_cache));
    s.force_production_batch_sizes = ctx.config.force_production_batch_sizes;
    s.metrics = metrics;
    s.span_mem = Some(span_mem);

    debug!(
        table = %spec.table.name,
        spans = spec.spans.len(),
        parallelize,
        batch_bytes_limit,
        "constructed batch scan"
    );
    Ok(s)
}

impl<F: RowFetchEngine> BatchScan<F> {
    /// Start the underlying scan. Idempotent: a second call after the first
    /// completed is a no-op.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        let span = tracing::info_span!("batch_scan");
        if !span.is_disabled() {
            self.tracing_span = Some(span);
        }

        let txn = self
            .txn
            .clone()
            .ok_or_else(|| Error::Internal("init called on a released batch scan".into()))?;
        let fetcher = self
            .fetcher
            .as_mut()
            .ok_or_else(|| Error::Internal("init called on a released batch scan".into()))?;
        fetcher.start_scan(
            txn,
            self.span_set.spans(),
            self.bs_header.as_ref(),
            !self.parallelize,
            self.batch_bytes_limit,
            self.limit_hint,
            self.force_production_batch_sizes,
        )
    }

    /// Pull the next batch. Empty means the scan is exhausted; metrics stay
    /// valid to query afterwards. Any engine error is fatal to this
    /// operator and propagates without retry.
    pub fn next(&mut self) -> Result<Batch> {
        let _enter = self.tracing_span.as_ref().map(tracing::Span::enter);
        let fetcher = self
            .fetcher
            .as_mut()
            .ok_or_else(|| Error::Internal("next called on a released batch scan".into()))?;
        let batch = fetcher.next_batch()?;
        if batch.selection().is_some() {
            return Err(Error::Internal(
                "unexpectedly a selection vector is set on the batch coming from the row fetcher"
                    .into(),
            ));
        }
        self.metrics.record_rows(batch.num_rows() as u64);
        Ok(batch)
    }

    /// Cloneable handle for progress watchers on other threads.
    pub fn metrics_handle(&self) -> ScanMetrics {
        self.metrics.clone()
    }

    pub fn is_parallelized(&self) -> bool {
        self.parallelize
    }

    pub fn batch_bytes_limit(&self) -> u64 {
        self.batch_bytes_limit
    }

    pub fn spans(&self) -> &[colscan_core::span::Span] {
        self.span_set.spans()
    }

    /// Return this operator and its pooled parts to `pools`. Only valid
    /// after `close`, but also safe after a failed `init` (the engine is
    /// closed here regardless). Consumes the operator, so a released
    /// instance cannot be used or released again.
    pub fn release(mut self, pools: &ScanPools<F>)
    where
        F: Poolable,
    {
        if let Some(mut fetcher) = self.fetcher.take() {
            fetcher.close();
            pools.fetchers.release(fetcher);
        }
        if let Some(projection) = self.projection.take() {
            pools.projections.release(projection);
        }
        // Reverses the span-copy budget charge.
        self.span_mem = None;
        self.span_set.reset();
        pools.operators.release(self);
    }
}

impl<F: RowFetchEngine> KvReader for BatchScan<F> {
    fn bytes_read(&self) -> u64 {
        // A never-initialized or released operator reports 0.
        self.fetcher.as_ref().map(|f| f.bytes_read()).unwrap_or(0)
    }

    fn rows_read(&self) -> u64 {
        self.metrics.rows_read()
    }

    fn cumulative_contention_time(&self) -> Duration {
        self.metrics.cumulative_contention_time()
    }

    fn scan_stats(&self) -> ScanStats {
        self.metrics.scan_stats()
    }
}

impl<F: RowFetchEngine> ClosableOperator for BatchScan<F> {
    /// Close the fetch engine and finish the tracing span. Idempotent.
    fn close(&mut self) -> Result<()> {
        if let Some(fetcher) = self.fetcher.as_mut() {
            fetcher.close();
        }
        // Dropping the span finishes it.
        self.tracing_span = None;
        debug!("closed batch scan");
        Ok(())
    }
}

impl<F: RowFetchEngine> MetadataSource for BatchScan<F> {
    /// Assemble trailing metadata in the framework's expected order:
    /// misplanned ranges, leaf transaction state, metrics, trace data.
    fn drain_meta(&mut self) -> Vec<ProducerMetadata> {
        let mut trailing = Vec::new();
        if !self.local {
            if let (Some(node_id), Some(cache)) = (self.node_id, self.range_cache.as_ref()) {
                if let Some(ranges) = cache.misplanned_ranges(self.span_set.copy(), node_id) {
                    trailing.push(ProducerMetadata::Ranges(ranges));
                }
            }
        }
        if let Some(tfs) = self.txn.as_ref().and_then(|t| t.leaf_final_state()) {
            trailing.push(ProducerMetadata::LeafTxnFinalState(tfs));
        }
        trailing.push(ProducerMetadata::Metrics(QueryMetrics {
            bytes_read: self.bytes_read(),
            rows_read: self.rows_read(),
        }));
        if let Some(span) = &self.tracing_span {
            if !span.is_disabled() {
                trailing.push(ProducerMetadata::TraceData(TraceData {
                    operator: "batch_scan",
                    contention_nanos: self.cumulative_contention_time().as_nanos() as u64,
                }));
            }
        }
        trailing
    }
}

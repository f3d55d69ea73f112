//! Trailing metadata assembly tests: misplanned ranges, leaf transaction
//! state, metrics, and their fixed ordering.

use std::sync::Arc;
use std::time::Duration;

use colscan_core::batch::Scalar;
use colscan_core::catalog::{ColumnDescriptor, IndexDescriptor, TableDescriptor};
use colscan_core::id::{ColumnId, IndexId, NodeId, RangeId, TableId};
use colscan_core::schema::{ColumnType, DataType, StaticTypeResolver};
use colscan_core::span::Span;
use colscan_kv::{MemKv, RangeCache, RangeInfo, Txn};
use colscan_mem::MemoryBudgetImpl;
use colscan_scan::{
    new_batch_scan, ClosableOperator, FlowContext, KvReader, KvRowFetcher, MetadataSource,
    ProducerMetadata, QueryMetrics, ScanPools, ScanSpec,
};

fn test_table() -> Arc<TableDescriptor> {
    Arc::new(TableDescriptor::new(
        TableId::new(1),
        "t",
        vec![
            ColumnDescriptor::new(ColumnId::new(1), "k", ColumnType::Builtin(DataType::Int64)),
            ColumnDescriptor::new(ColumnId::new(2), "v", ColumnType::Builtin(DataType::Utf8)),
        ],
        vec![IndexDescriptor {
            id: IndexId::new(1),
            name: "primary".into(),
            primary: true,
        }],
    ))
}

fn populated_store() -> Arc<MemKv> {
    let store = Arc::new(MemKv::new());
    for i in 0..4i64 {
        let key = format!("a{i}");
        let row = vec![Scalar::I64(i), Scalar::Str(format!("row-{i}"))];
        store.put_row(key.into_bytes(), &row).expect("put_row");
    }
    store
}

fn spec(table: Arc<TableDescriptor>) -> ScanSpec {
    let mut spec = ScanSpec::new(table, vec![Span::new(*b"a", *b"b")]);
    spec.needed_columns = vec![0, 1];
    spec
}

fn run_to_exhaustion(scan: &mut colscan_scan::BatchScan<KvRowFetcher>) {
    scan.init().expect("init");
    loop {
        if scan.next().expect("next").is_empty() {
            break;
        }
    }
}

#[test]
fn test_local_flow_emits_only_metrics() {
    let ctx = FlowContext::local(populated_store());
    let budget = MemoryBudgetImpl::new(1024 * 1024);
    let resolver = StaticTypeResolver::new();
    let pools: ScanPools<KvRowFetcher> = ScanPools::new();

    let mut scan =
        new_batch_scan(&pools, &ctx, &budget, &resolver, &spec(test_table())).expect("construct");
    run_to_exhaustion(&mut scan);

    let meta = scan.drain_meta();
    // Local flow, root txn, no tracing subscriber: metrics only.
    assert_eq!(meta.len(), 1);
    match &meta[0] {
        ProducerMetadata::Metrics(m) => {
            assert_eq!(m.rows_read, 4);
            assert!(m.bytes_read > 0);
            // Wire form, as shipped back to the coordinator.
            let json = serde_json::to_string(m).expect("serialize metrics");
            let back: QueryMetrics = serde_json::from_str(&json).expect("deserialize metrics");
            assert_eq!(&back, m);
        }
        other => panic!("expected metrics, got {other:?}"),
    }

    scan.close().expect("close");
    scan.release(&pools);
}

#[test]
fn test_distributed_flow_reports_misplanned_ranges_and_leaf_state() {
    let store = populated_store();
    let cache = Arc::new(RangeCache::new());
    // One overlapping range lives on another node, one is local.
    cache.insert(RangeInfo {
        range_id: RangeId::new(10),
        span: Span::new(*b"a", *b"a2"),
        lease_holder: NodeId::new(2),
    });
    cache.insert(RangeInfo {
        range_id: RangeId::new(11),
        span: Span::new(*b"a2", *b"b"),
        lease_holder: NodeId::new(1),
    });
    let txn = Arc::new(Txn::leaf());
    let ctx = FlowContext::distributed(store, txn, NodeId::new(1), cache);
    let budget = MemoryBudgetImpl::new(1024 * 1024);
    let resolver = StaticTypeResolver::new();
    let pools: ScanPools<KvRowFetcher> = ScanPools::new();

    let mut scan =
        new_batch_scan(&pools, &ctx, &budget, &resolver, &spec(test_table())).expect("construct");
    run_to_exhaustion(&mut scan);

    let meta = scan.drain_meta();
    assert_eq!(meta.len(), 3, "ranges, leaf state, metrics: {meta:?}");

    // Ordering is a contract: ranges before txn state before metrics.
    match &meta[0] {
        ProducerMetadata::Ranges(ranges) => {
            assert_eq!(ranges.len(), 1);
            assert_eq!(ranges[0].range_id, RangeId::new(10));
        }
        other => panic!("expected ranges first, got {other:?}"),
    }
    match &meta[1] {
        ProducerMetadata::LeafTxnFinalState(tfs) => {
            assert_eq!(tfs.read_spans, vec![Span::new(*b"a", *b"b")]);
        }
        other => panic!("expected leaf txn state second, got {other:?}"),
    }
    assert!(matches!(meta[2], ProducerMetadata::Metrics(_)));

    scan.close().expect("close");
    scan.release(&pools);
}

#[test]
fn test_distributed_flow_with_all_local_ranges_omits_ranges() {
    let store = populated_store();
    let cache = Arc::new(RangeCache::new());
    cache.insert(RangeInfo {
        range_id: RangeId::new(10),
        span: Span::new(*b"a", *b"b"),
        lease_holder: NodeId::new(1),
    });
    let ctx = FlowContext::distributed(store, Arc::new(Txn::root()), NodeId::new(1), cache);
    let budget = MemoryBudgetImpl::new(1024 * 1024);
    let resolver = StaticTypeResolver::new();
    let pools: ScanPools<KvRowFetcher> = ScanPools::new();

    let mut scan =
        new_batch_scan(&pools, &ctx, &budget, &resolver, &spec(test_table())).expect("construct");
    run_to_exhaustion(&mut scan);

    let meta = scan.drain_meta();
    // Root txn and no misplanned ranges: metrics only.
    assert_eq!(meta.len(), 1);
    assert!(matches!(meta[0], ProducerMetadata::Metrics(_)));

    scan.close().expect("close");
    scan.release(&pools);
}

#[test]
fn test_trace_data_is_last_and_carries_contention() {
    // The tracing span only opens when a subscriber records it; the trace
    // data item in turn only appears when the span is live.
    tracing::subscriber::with_default(tracing_subscriber::registry(), || {
        let ctx = FlowContext::local(populated_store());
        let budget = MemoryBudgetImpl::new(1024 * 1024);
        let resolver = StaticTypeResolver::new();
        let pools: ScanPools<KvRowFetcher> = ScanPools::new();

        let mut scan = new_batch_scan(&pools, &ctx, &budget, &resolver, &spec(test_table()))
            .expect("construct");
        run_to_exhaustion(&mut scan);

        // Contention reported by the engine side through a cloned handle.
        let handle = scan.metrics_handle();
        handle.add_contention(Duration::from_nanos(1234));
        assert!(scan.cumulative_contention_time() >= Duration::from_nanos(1234));

        let meta = scan.drain_meta();
        assert_eq!(meta.len(), 2, "metrics then trace data: {meta:?}");
        assert!(matches!(meta[0], ProducerMetadata::Metrics(_)));
        match &meta[1] {
            ProducerMetadata::TraceData(td) => {
                assert_eq!(td.operator, "batch_scan");
                assert_eq!(
                    Duration::from_nanos(td.contention_nanos),
                    scan.cumulative_contention_time()
                );
            }
            other => panic!("expected trace data last, got {other:?}"),
        }

        scan.close().expect("close");
        scan.release(&pools);
    });
}

#[test]
fn test_leaf_state_omitted_without_reads() {
    // A leaf transaction that never performed a read reports nothing.
    let txn = Arc::new(Txn::leaf());
    assert!(txn.leaf_final_state().is_none());
    txn.record_read_span(Span::new(*b"a", *b"b"));
    let tfs = txn.leaf_final_state().expect("leaf state");
    assert_eq!(tfs.read_spans.len(), 1);

    // Root transactions never report, reads or not.
    let root = Arc::new(Txn::root());
    root.record_read_span(Span::new(*b"a", *b"b"));
    assert!(root.leaf_final_state().is_none());
}

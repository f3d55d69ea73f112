use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use colscan_core::batch::Scalar;
use colscan_core::catalog::{ColumnDescriptor, IndexDescriptor, TableDescriptor};
use colscan_core::id::{ColumnId, IndexId, TableId};
use colscan_core::schema::{ColumnType, DataType, StaticTypeResolver};
use colscan_core::span::Span;
use colscan_kv::MemKv;
use colscan_mem::MemoryBudgetImpl;
use colscan_scan::{
    new_batch_scan, ClosableOperator, FlowContext, KvRowFetcher, ScanPools, ScanSpec,
};

fn make_table() -> Arc<TableDescriptor> {
    Arc::new(TableDescriptor::new(
        TableId::new(1),
        "bench_table",
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

fn populate(store: &MemKv, rows: usize) {
    for i in 0..rows {
        let key = format!("row-{i:06}");
        let row = vec![Scalar::I64(i as i64), Scalar::Str(format!("value-{i}"))];
        store.put_row(key.into_bytes(), &row).unwrap();
    }
}

fn bench_scan_lifecycle(c: &mut Criterion) {
    let store = Arc::new(MemKv::new());
    populate(&store, 4096);
    let table = make_table();
    let ctx = FlowContext::local(Arc::clone(&store));
    let budget = MemoryBudgetImpl::new(64 * 1024 * 1024);
    let resolver = StaticTypeResolver::new();
    let pools: ScanPools<KvRowFetcher> = ScanPools::new();

    let mut spec = ScanSpec::new(
        table,
        vec![Span::new(*b"row-000000", *b"row-999999")],
    );
    spec.needed_columns = vec![0, 1];

    c.bench_function("scan_4k_rows", |b| {
        b.iter(|| {
            let mut scan = new_batch_scan(&pools, &ctx, &budget, &resolver, &spec).unwrap();
            scan.init().unwrap();
            let mut rows = 0usize;
            loop {
                let batch = scan.next().unwrap();
                if batch.is_empty() {
                    break;
                }
                rows += batch.num_rows();
            }
            assert_eq!(rows, 4096);
            scan.close().unwrap();
            scan.release(&pools);
        })
    });
}

criterion_group!(scans, bench_scan_lifecycle);
criterion_main!(scans);

//! Column-projection resolver tests

use std::sync::Arc;

use colscan_core::catalog::{
    ColumnDescriptor, ColumnVisibility, IndexDescriptor, TableDescriptor,
};
use colscan_core::id::{ColumnId, IndexId, TableId, UserTypeId};
use colscan_core::schema::{ColumnType, DataType, StaticTypeResolver};
use colscan_scan::{resolve_projection, ColumnProjection, ObjectPool, ScanVisibility};

fn primary_index() -> IndexDescriptor {
    IndexDescriptor {
        id: IndexId::new(1),
        name: "primary".into(),
        primary: true,
    }
}

fn test_table() -> Arc<TableDescriptor> {
    let mut hidden = ColumnDescriptor::new(
        ColumnId::new(3),
        "backfilling",
        ColumnType::Builtin(DataType::Int64),
    );
    hidden.visibility = ColumnVisibility::NotPublic;

    let mut mvcc = ColumnDescriptor::new(
        ColumnId::new(100),
        "crdb_internal_mvcc_timestamp",
        ColumnType::Builtin(DataType::Decimal128),
    );
    mvcc.system = true;

    Arc::new(TableDescriptor::new(
        TableId::new(1),
        "t",
        vec![
            ColumnDescriptor::new(ColumnId::new(1), "k", ColumnType::Builtin(DataType::Int64)),
            ColumnDescriptor::new(ColumnId::new(2), "j", ColumnType::Builtin(DataType::Utf8)),
            hidden,
            mvcc,
        ],
        vec![primary_index()],
    ))
}

#[test]
fn test_visibility_filters_non_public_columns() {
    let table = test_table();
    let pool: ObjectPool<ColumnProjection> = ObjectPool::new();
    let resolver = StaticTypeResolver::new();
    let index = primary_index();

    let proj = resolve_projection(
        &pool,
        &table,
        &index,
        None,
        ScanVisibility::Public,
        false,
        &resolver,
    )
    .expect("resolve");
    let names: Vec<_> = proj.columns.iter().map(|c| c.name.clone()).collect();
    assert_eq!(names, vec!["k", "j"]);
    pool.release(proj);

    let proj = resolve_projection(
        &pool,
        &table,
        &index,
        None,
        ScanVisibility::PublicAndNotPublic,
        false,
        &resolver,
    )
    .expect("resolve");
    let names: Vec<_> = proj.columns.iter().map(|c| c.name.clone()).collect();
    assert_eq!(names, vec!["k", "j", "backfilling"]);
    pool.release(proj);
}

#[test]
fn test_system_columns_are_a_trailing_block() {
    let table = test_table();
    let pool: ObjectPool<ColumnProjection> = ObjectPool::new();
    let resolver = StaticTypeResolver::new();
    let index = primary_index();

    let proj = resolve_projection(
        &pool,
        &table,
        &index,
        None,
        ScanVisibility::Public,
        true,
        &resolver,
    )
    .expect("resolve");

    assert_eq!(proj.num_columns(), 3);
    let last = proj.columns.last().unwrap();
    assert!(last.system);
    assert_eq!(last.name, "crdb_internal_mvcc_timestamp");
    // The ordinal map covers system columns too.
    assert_eq!(proj.col_idx_map[&ColumnId::new(100)], 2);
    pool.release(proj);
}

#[test]
fn test_inverted_column_substituted_in_place() {
    let table = test_table();
    let pool: ObjectPool<ColumnProjection> = ObjectPool::new();
    let resolver = StaticTypeResolver::new();
    let index = primary_index();

    let inverted = table
        .find_inverted_column(ColumnId::new(2))
        .expect("inverted column");
    let proj = resolve_projection(
        &pool,
        &table,
        &index,
        Some(&inverted),
        ScanVisibility::Public,
        false,
        &resolver,
    )
    .expect("resolve");

    // Position and identity preserved, type replaced by the inverted
    // encoding's type.
    assert_eq!(proj.columns[1].id, ColumnId::new(2));
    assert_eq!(proj.columns[1].name, "j_inverted_key");
    assert_eq!(proj.types[1], ColumnType::Builtin(DataType::Binary));
    assert_eq!(proj.col_idx_map[&ColumnId::new(2)], 1);
    pool.release(proj);
}

#[test]
fn test_types_parallel_to_columns() {
    let table = test_table();
    let pool: ObjectPool<ColumnProjection> = ObjectPool::new();
    let resolver = StaticTypeResolver::new();
    let index = primary_index();

    let proj = resolve_projection(
        &pool,
        &table,
        &index,
        None,
        ScanVisibility::PublicAndNotPublic,
        true,
        &resolver,
    )
    .expect("resolve");
    assert_eq!(proj.types.len(), proj.columns.len());
    assert!(proj.types.iter().all(|t| t.is_hydrated()));
    pool.release(proj);
}

#[test]
fn test_hydration_failure_aborts_and_returns_to_pool() {
    let table = Arc::new(TableDescriptor::new(
        TableId::new(2),
        "udt_table",
        vec![
            ColumnDescriptor::new(ColumnId::new(1), "k", ColumnType::Builtin(DataType::Int64)),
            ColumnDescriptor::new(
                ColumnId::new(2),
                "status",
                ColumnType::Unresolved(UserTypeId::new(9)),
            ),
        ],
        vec![primary_index()],
    ));
    let pool: ObjectPool<ColumnProjection> = ObjectPool::new();
    let index = primary_index();

    // Resolver without the type registered: hydration must fail and the
    // projection must land back in the pool.
    let resolver = StaticTypeResolver::new();
    let err = resolve_projection(
        &pool,
        &table,
        &index,
        None,
        ScanVisibility::Public,
        false,
        &resolver,
    )
    .unwrap_err();
    assert!(!err.is_internal());
    assert_eq!(pool.idle(), 1);

    // With the type registered hydration succeeds in place.
    let mut resolver = StaticTypeResolver::new();
    resolver.register(UserTypeId::new(9), DataType::Utf8);
    let proj = resolve_projection(
        &pool,
        &table,
        &index,
        None,
        ScanVisibility::Public,
        false,
        &resolver,
    )
    .expect("resolve");
    assert_eq!(proj.types[1], ColumnType::Builtin(DataType::Utf8));
    pool.release(proj);
}

//! Performance benchmarks for modifiable-state operations.
//!
//! Run with: cargo bench --package modifiable-state

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use modifiable_state::{apply_patch, Op, Patch, Pointer, Value};
use serde_json::json;

// ============================================================================
// Helper functions to generate test data
// ============================================================================

/// Generate a flat document with N fields
fn generate_flat_doc(num_fields: usize) -> Value {
    let mut obj = serde_json::Map::new();
    for i in 0..num_fields {
        obj.insert(format!("field_{}", i), json!(i));
    }
    Value::from(json!(obj))
}

/// Generate a deeply nested document
fn generate_nested_doc(depth: usize) -> Value {
    let mut current = json!({"value": 42});
    for i in (0..depth).rev() {
        let mut obj = serde_json::Map::new();
        obj.insert(format!("level_{}", i), current);
        current = json!(obj);
    }
    Value::from(current)
}

/// Generate a patch with N add operations
fn generate_add_patch(num_ops: usize) -> Patch {
    (0..num_ops)
        .map(|i| Op::add(Pointer::root().key(format!("field_{}", i)), Value::from((i * 2) as u64)))
        .collect()
}

// ============================================================================
// Benchmark: apply_patch with varying document sizes
// ============================================================================

fn bench_apply_patch_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_patch_flat_doc");

    for num_fields in [10, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(num_fields as u64));

        let doc = generate_flat_doc(num_fields);
        let patch = generate_add_patch(num_fields / 10); // 10% of fields modified

        group.bench_with_input(
            BenchmarkId::from_parameter(num_fields),
            &num_fields,
            |b, _| {
                b.iter(|| {
                    let result = apply_patch(black_box(&doc), black_box(&patch));
                    black_box(result)
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Benchmark: apply_patch with deep nesting
// ============================================================================

fn bench_apply_patch_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_patch_nested_doc");

    for depth in [5, 10, 20, 50] {
        let doc = generate_nested_doc(depth);

        // Modify the deepest value
        let pointer = (0..depth)
            .fold(Pointer::root(), |p, i| p.key(format!("level_{}", i)))
            .key("value");
        let patch = Patch::new().with_op(Op::replace(pointer, Value::from(999i64)));

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let result = apply_patch(black_box(&doc), black_box(&patch));
                black_box(result)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Different operation types
// ============================================================================

fn bench_operation_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("operation_types");

    let doc = Value::from(json!({
        "counter": 0,
        "items": [1, 2, 3],
        "user": {"name": "Alice", "age": 30}
    }));

    group.bench_function("add", |b| {
        let patch = Patch::new().with_op(Op::add(Pointer::root().key("counter"), Value::from(42i64)));
        b.iter(|| black_box(apply_patch(black_box(&doc), black_box(&patch))));
    });

    group.bench_function("append", |b| {
        let patch = Patch::new().with_op(Op::add(
            Pointer::root().key("items").key("-"),
            Value::from(4i64),
        ));
        b.iter(|| black_box(apply_patch(black_box(&doc), black_box(&patch))));
    });

    group.bench_function("move", |b| {
        let patch = Patch::new().with_op(Op::move_to(
            Pointer::root().key("user"),
            Pointer::root().key("owner"),
        ));
        b.iter(|| black_box(apply_patch(black_box(&doc), black_box(&patch))));
    });

    group.bench_function("no_op_add", |b| {
        let patch = Patch::new().with_op(Op::add(Pointer::root().key("counter"), Value::from(0i64)));
        b.iter(|| black_box(apply_patch(black_box(&doc), black_box(&patch))));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_apply_patch_flat,
    bench_apply_patch_nested,
    bench_operation_types,
);

criterion_main!(benches);

//! Handle and call marshaling benchmarks
//!
//! Measures the per-operation cost of refcounting, argument packing and
//! container access through the bridge.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pyobj::{args, builtin, call, Handle, Kwargs, List};

fn int_list(n: usize) -> List {
    (0..n as i64).map(Handle::from).collect()
}

fn bench_handle(c: &mut Criterion) {
    pyobj::init();
    let mut group = c.benchmark_group("handle");

    let value = Handle::from("shared");
    group.bench_function("clone_drop", |b| {
        b.iter(|| drop(black_box(value.clone())));
    });
    group.bench_function("from_i64", |b| {
        b.iter(|| Handle::from(black_box(42i64)));
    });
    group.bench_function("kind", |b| {
        b.iter(|| black_box(&value).kind());
    });

    group.finish();
}

fn bench_call(c: &mut Criterion) {
    pyobj::init();
    let mut group = c.benchmark_group("call");

    let len = builtin("len");
    let sorted = builtin("sorted");
    for size in [1, 16, 256].iter() {
        let items = int_list(*size);
        group.bench_with_input(BenchmarkId::new("len", size), size, |b, _| {
            b.iter(|| call(&len, &args![&items], None));
        });

        let kwargs = Kwargs::new().arg("reverse", true);
        group.bench_with_input(BenchmarkId::new("sorted_reverse", size), size, |b, _| {
            b.iter(|| call(&sorted, &args![&items], Some(&kwargs)));
        });
    }

    let max = builtin("max");
    group.bench_function("max_8_args", |b| {
        b.iter(|| call(&max, &args![1, 2, 3, 4, 5, 6, 7, 8], None));
    });

    group.finish();
}

fn bench_list_access(c: &mut Criterion) {
    pyobj::init();
    let mut group = c.benchmark_group("list");

    for size in [16, 1024].iter() {
        let items = int_list(*size);
        group.bench_with_input(BenchmarkId::new("get_negative", size), size, |b, _| {
            b.iter(|| items.get(black_box(-1)));
        });
        group.bench_with_input(BenchmarkId::new("iterate", size), size, |b, _| {
            b.iter(|| items.iter().filter_map(|item| item.as_i64()).sum::<i64>());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_handle, bench_call, bench_list_access);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use arbor::{Configuration, Serialization, Setting, Snapshot, Value, ValueHolder};

const TREE_SIZES: &[usize] = &[10, 100, 1000];

fn wide_snapshot(size: usize) -> Snapshot {
    (0..size)
        .map(|i| {
            let entry = Value::map([
                ("name", Value::from(format!("entry-{i}"))),
                ("port", Value::from(i.to_string())),
                ("tags", Value::list(["a", "b", "c"])),
            ]);
            (format!("e{i}"), entry)
        })
        .collect()
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    for &size in TREE_SIZES {
        let snapshot = wide_snapshot(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &snapshot, |b, snapshot| {
            b.iter(|| Configuration::from_snapshot(black_box(snapshot.clone())));
        });
    }

    group.finish();
}

fn bench_navigation(c: &mut Criterion) {
    let mut group = c.benchmark_group("navigation");
    let mut config = Configuration::from_snapshot(wide_snapshot(1000));

    group.bench_function("existing_path", |b| {
        b.iter(|| config.get_node(black_box("e500.port")).map(|mut n| n.value()));
    });

    group.bench_function("missing_path", |b| {
        b.iter(|| config.get_node(black_box("e500.absent.deeper")).map(|mut n| n.value()));
    });

    group.bench_function("deep_keys", |b| {
        b.iter(|| config.get_keys(black_box(true)));
    });

    group.finish();
}

fn bench_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("writes");

    group.bench_function("set_new_paths", |b| {
        b.iter_batched(
            Configuration::in_memory,
            |mut config| {
                for i in 0..100 {
                    config.set(&format!("a.b{i}.c"), i).ok();
                }
                config
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_typed_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_reads");
    let serialization = Serialization::new();
    let ty = <Vec<i64>>::descriptor();
    let raw = Value::list((0..100).map(|i| i.to_string()));

    group.bench_function("list_of_long_cached", |b| {
        b.iter(|| serialization.deserialize(black_box(&ty), black_box(&raw)));
    });

    let mut config = Configuration::from_snapshot(wide_snapshot(100));
    group.bench_function("node_get_int", |b| {
        b.iter(|| config.get_node("e50.port").map(|mut n| n.get_int(0)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_rebuild,
    bench_navigation,
    bench_writes,
    bench_typed_reads
);
criterion_main!(benches);

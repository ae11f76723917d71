//! Criterion benchmarks for loading schemas into a pool.
//!
//! Covers the full build path (create, resolve, compile layouts), loading
//! with precompiled layouts, and name lookups on a loaded pool.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use hpb_bench::{reference_schema, stress_schema};
use hpb_defs::DefPool;
use hpb_descriptor::Message;

fn bench_add_file_100(c: &mut Criterion) {
    let file = reference_schema(42);
    c.bench_function("add_file_100_msgs", |b| {
        b.iter_batched(
            || DefPool::new().unwrap(),
            |mut pool| {
                black_box(pool.add_file(&file).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_add_file_bytes_100(c: &mut Criterion) {
    let bytes = reference_schema(42).encode_to_vec();
    c.bench_function("add_file_bytes_100_msgs", |b| {
        b.iter_batched(
            || DefPool::new().unwrap(),
            |mut pool| {
                black_box(pool.add_file_bytes(&bytes).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_add_file_2000(c: &mut Criterion) {
    let file = stress_schema(42);
    let mut group = c.benchmark_group("stress");
    group.sample_size(20);
    group.bench_function("add_file_2000_msgs", |b| {
        b.iter_batched(
            || DefPool::new().unwrap(),
            |mut pool| {
                black_box(pool.add_file(&file).unwrap());
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_add_file_with_layout_100(c: &mut Criterion) {
    let file = reference_schema(42);
    let mut source = DefPool::new().unwrap();
    let id = source.add_file(&file).unwrap();
    let layout = source.file(id).mini_table_file(&source);
    c.bench_function("add_file_with_layout_100_msgs", |b| {
        b.iter_batched(
            || DefPool::new().unwrap(),
            |mut pool| {
                black_box(pool.add_file_with_layout(&file, &layout).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_rejected_file(c: &mut Criterion) {
    let mut file = reference_schema(42);
    file.message_type[99].field[0].type_name = Some(".bench.Missing".into());
    file.message_type[99].field[0].r#type = Some(hpb_core::FieldType::Message as i32);
    c.bench_function("rejected_file_rollback_100_msgs", |b| {
        b.iter_batched(
            || DefPool::new().unwrap(),
            |mut pool| {
                black_box(pool.add_file(&file).unwrap_err());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_find_message(c: &mut Criterion) {
    let mut pool = DefPool::new().unwrap();
    pool.add_file(&reference_schema(42)).unwrap();
    let names: Vec<String> = (0..100).map(|i| format!("bench.M{i}")).collect();
    c.bench_function("find_message_by_name_100", |b| {
        b.iter(|| {
            for n in &names {
                black_box(pool.find_message_by_name(black_box(n)));
            }
        });
    });
}

fn bench_field_by_number(c: &mut Criterion) {
    let mut pool = DefPool::new().unwrap();
    pool.add_file(&reference_schema(42)).unwrap();
    let m = pool.find_message_by_name("bench.M50").unwrap();
    let msg = pool.message(m);
    let numbers: Vec<u32> = msg.fields().iter().map(|&f| pool.field(f).number()).collect();
    let table = msg.mini_table(&pool).unwrap();
    c.bench_function("field_by_number_defs_vs_layout", |b| {
        b.iter(|| {
            for &n in &numbers {
                black_box(msg.find_field_by_number(black_box(n)));
                black_box(table.find_field_by_number(black_box(n)));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_add_file_100,
    bench_add_file_bytes_100,
    bench_add_file_2000,
    bench_add_file_with_layout_100,
    bench_rejected_file,
    bench_find_message,
    bench_field_by_number
);
criterion_main!(benches);

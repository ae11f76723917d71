//! Criterion micro-benchmarks for the symbol and field-number tables.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use hpb_arena::Arena;
use hpb_bench::symbol_keys;
use hpb_table::{IntTable, StrTable};

fn filled_str_table(keys: &[Vec<u8>], arena: &Arena) -> StrTable {
    let mut t = StrTable::new(keys.len(), arena).unwrap();
    for (i, k) in keys.iter().enumerate() {
        t.insert(k, i as u64, arena).unwrap();
    }
    t
}

fn bench_str_insert_10k(c: &mut Criterion) {
    let keys = symbol_keys(42, 10_000);
    c.bench_function("str_insert_10k", |b| {
        b.iter_batched(
            Arena::new,
            |arena| {
                let t = filled_str_table(&keys, &arena);
                black_box(t.count());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_str_lookup_hit(c: &mut Criterion) {
    let keys = symbol_keys(42, 10_000);
    let arena = Arena::new();
    let t = filled_str_table(&keys, &arena);
    c.bench_function("str_lookup_hit_10k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for k in &keys {
                sum += t.lookup(black_box(k)).unwrap_or(0);
            }
            black_box(sum);
        });
    });
}

fn bench_str_lookup_miss(c: &mut Criterion) {
    let keys = symbol_keys(42, 10_000);
    let misses = symbol_keys(43, 1_000);
    let arena = Arena::new();
    let t = filled_str_table(&keys, &arena);
    c.bench_function("str_lookup_miss_1k", |b| {
        b.iter(|| {
            let mut found = 0usize;
            for k in &misses {
                found += usize::from(t.lookup(black_box(k)).is_some());
            }
            black_box(found);
        });
    });
}

fn bench_int_dense(c: &mut Criterion) {
    let arena = Arena::new();
    let mut t = IntTable::new(&arena).unwrap();
    for n in 1..=64u64 {
        t.insert(n, n * 3, &arena).unwrap();
    }
    t.compact(&arena).unwrap();
    c.bench_function("int_lookup_dense_64", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for n in 1..=64u64 {
                sum += t.lookup(black_box(n)).unwrap_or(0);
            }
            black_box(sum);
        });
    });
}

fn bench_int_sparse(c: &mut Criterion) {
    let arena = Arena::new();
    let mut t = IntTable::new(&arena).unwrap();
    let keys: Vec<u64> = (0..64u64).map(|i| 1 + i * 9_973).collect();
    for &k in &keys {
        t.insert(k, k, &arena).unwrap();
    }
    t.compact(&arena).unwrap();
    c.bench_function("int_lookup_sparse_64", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for &k in &keys {
                sum += t.lookup(black_box(k)).unwrap_or(0);
            }
            black_box(sum);
        });
    });
}

criterion_group!(
    benches,
    bench_str_insert_10k,
    bench_str_lookup_hit,
    bench_str_lookup_miss,
    bench_int_dense,
    bench_int_sparse
);
criterion_main!(benches);

//! Benchmark: ortak-map against in-process map baselines.
//!
//! The baselines (dashmap, a mutexed std HashMap) keep their state in
//! process-local heap memory; ortak-map pays for region encoding and the
//! region-resident lock but can hand its state to another context for
//! free.

use std::collections::HashMap;
use std::sync::Mutex;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ortak::Value;
use ortak_map::{MapOptions, ShareableMap};

const SMALL_OPS: usize = 1_000;
const MEDIUM_OPS: usize = 10_000;

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for &size in &[SMALL_OPS, MEDIUM_OPS] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("ortak-map", size), &size, |b, &size| {
            b.iter(|| {
                let map = ShareableMap::new(MapOptions::default()).unwrap();
                for i in 0..size {
                    map.set(format!("key-{}", i).as_str(), black_box(i as i32))
                        .unwrap();
                }
                map
            });
        });

        group.bench_with_input(BenchmarkId::new("dashmap", size), &size, |b, &size| {
            b.iter(|| {
                let map = dashmap::DashMap::new();
                for i in 0..size {
                    map.insert(format!("key-{}", i), black_box(i as i32));
                }
                map
            });
        });

        group.bench_with_input(
            BenchmarkId::new("mutex-hashmap", size),
            &size,
            |b, &size| {
                b.iter(|| {
                    let map = Mutex::new(HashMap::new());
                    for i in 0..size {
                        map.lock()
                            .unwrap()
                            .insert(format!("key-{}", i), black_box(i as i32));
                    }
                    map
                });
            },
        );
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for &size in &[SMALL_OPS, MEDIUM_OPS] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("ortak-map", size), &size, |b, &size| {
            let map = ShareableMap::new(MapOptions::default()).unwrap();
            for i in 0..size {
                map.set(format!("key-{}", i).as_str(), i as i32).unwrap();
            }
            b.iter(|| {
                let mut sum = 0i64;
                for i in 0..size {
                    if let Some(Value::Int(v)) =
                        map.get(format!("key-{}", black_box(i)).as_str()).unwrap()
                    {
                        sum += v as i64;
                    }
                }
                sum
            });
        });

        group.bench_with_input(BenchmarkId::new("dashmap", size), &size, |b, &size| {
            let map = dashmap::DashMap::new();
            for i in 0..size {
                map.insert(format!("key-{}", i), i as i32);
            }
            b.iter(|| {
                let mut sum = 0i64;
                for i in 0..size {
                    if let Some(v) = map.get(&format!("key-{}", black_box(i))) {
                        sum += *v as i64;
                    }
                }
                sum
            });
        });
    }

    group.finish();
}

fn bench_update_in_place(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_in_place");
    group.throughput(Throughput::Elements(SMALL_OPS as u64));

    group.bench_function("ortak-map", |b| {
        let map = ShareableMap::new(MapOptions::default()).unwrap();
        map.set("hot", 0).unwrap();
        b.iter(|| {
            for i in 0..SMALL_OPS {
                map.set("hot", black_box(i as i32)).unwrap();
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_get, bench_update_in_place);
criterion_main!(benches);

//! Performance benchmarks for crud-kit
//!
//! This benchmark suite measures:
//! - CacheStore operations (set, get hit/miss, peek_stale)
//! - CacheExpander `with_cache` on the fresh-hit and miss paths
//! - Performance across different payload sizes
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use crud_kit::backend::InMemoryBackend;
use crud_kit::{CacheExpander, CacheStore, ConnectivityMonitor, OperationConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde::{Deserialize, Serialize};
use std::hint::black_box;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

// ============================================================================
// Benchmark Test Fixtures
// ============================================================================

/// Benchmark payload with configurable data size
#[derive(Clone, Serialize, Deserialize)]
struct BenchEntity {
    id: u64,
    data: String,
}

impl BenchEntity {
    fn new(id: u64, size: usize) -> Self {
        BenchEntity {
            id,
            data: "x".repeat(size),
        }
    }
}

fn expander() -> CacheExpander<InMemoryBackend> {
    CacheExpander::new(
        CacheStore::new(InMemoryBackend::new()),
        ConnectivityMonitor::new(),
    )
}

// ============================================================================
// Group 1: CacheStore Benchmarks
// ============================================================================

fn store_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_store");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let store = CacheStore::new(InMemoryBackend::new());
                let value = BenchEntity::new(1, size);

                b.iter(|| store.set(black_box("bench_key"), black_box(&value), None));
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let store = CacheStore::new(InMemoryBackend::new());
                store.set("bench_key", &BenchEntity::new(1, size), None);

                b.iter(|| store.get::<BenchEntity>(black_box("bench_key")));
            });
    }

    group.bench_function("get_miss", |b| {
        let store = CacheStore::new(InMemoryBackend::new());

        b.iter(|| store.get::<BenchEntity>(black_box("nonexistent_key")));
    });

    group.bench_function("peek_stale", |b| {
        let store = CacheStore::new(InMemoryBackend::new());
        store.set("bench_key", &BenchEntity::new(1, 1_000), None);

        b.iter(|| store.peek_stale::<BenchEntity>(black_box("bench_key")));
    });

    group.finish();
}

// ============================================================================
// Group 2: CacheExpander Benchmarks
// ============================================================================

fn expander_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_expander");

    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        // Fresh hit: lookup + decode + background refresh spawn
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("swr_hit", size), size, |b, &size| {
                let expander = expander();
                let payload = BenchEntity::new(1, size);
                expander.store().set("bench_hit", &payload, None);

                b.to_async(&rt).iter(|| {
                    let payload = payload.clone();
                    let expander = expander.clone();
                    async move {
                        expander
                            .with_cache(
                                black_box("bench_hit"),
                                move || async move { Ok(payload) },
                                OperationConfig::default(),
                            )
                            .await
                    }
                });
            });

        // Miss: lookup + fetch + encode + store
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("miss", size), size, |b, &size| {
                let expander = expander();
                let counter = Arc::new(AtomicU32::new(0));

                b.to_async(&rt).iter(|| {
                    let counter = counter.clone();
                    let expander = expander.clone();
                    async move {
                        // Unique key per iteration forces a miss
                        let current = counter.fetch_add(1, Ordering::Relaxed);
                        let key = format!("bench_miss_{}", current);
                        expander
                            .with_cache(
                                black_box(&key),
                                move || async move { Ok(BenchEntity::new(current as u64, size)) },
                                OperationConfig::default(),
                            )
                            .await
                    }
                });
            });
    }

    // Forced refresh over a warm entry
    group.bench_function("force_refresh", |b| {
        let expander = expander();
        expander
            .store()
            .set("bench_force", &BenchEntity::new(1, 1_000), None);

        b.to_async(&rt).iter(|| {
            let expander = expander.clone();
            async move {
                expander
                    .with_cache(
                        black_box("bench_force"),
                        || async { Ok(BenchEntity::new(1, 1_000)) },
                        OperationConfig::default().force_refresh(),
                    )
                    .await
            }
        });
    });

    group.finish();
}

criterion_group!(benches, store_benchmarks, expander_benchmarks);
criterion_main!(benches);

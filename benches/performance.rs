//! Performance benchmarks for the event bus.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use herald::{EventManager, JsonEventManager};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Benchmark fire with varying listener counts on one name
fn bench_fire_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire_fan_out");

    for listeners in [1, 10, 100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("listeners", listeners),
            &listeners,
            |b, &count| {
                let bus: EventManager<u64> = EventManager::new();
                let sum = Arc::new(AtomicU64::new(0));
                for _ in 0..count {
                    let sum = Arc::clone(&sum);
                    bus.on("tick", move |v: &u64| {
                        sum.fetch_add(*v, Ordering::Relaxed);
                    })
                    .unwrap();
                }

                b.iter(|| bus.fire("tick", black_box(1)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark fire when many unrelated names have topics
fn bench_fire_with_many_topics(c: &mut Criterion) {
    let mut group = c.benchmark_group("fire_many_topics");

    for topics in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("topics", topics), &topics, |b, &count| {
            let bus: EventManager<u64> = EventManager::new();
            for i in 0..count {
                bus.on(&format!("event.{i}"), |_v: &u64| {}).unwrap();
            }

            b.iter(|| bus.fire("event.0", black_box(1)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark change filtering on a stream of mostly-repeated values
fn bench_change_filter(c: &mut Criterion) {
    let bus: EventManager<u64> = EventManager::new();
    bus.change("level", |_v: &u64| {}).unwrap();

    let mut i = 0u64;
    c.bench_function("change_filter", |b| {
        b.iter(|| {
            i += 1;
            bus.fire("level", black_box(i / 10)).unwrap();
        })
    });
}

/// Benchmark subscribe/off churn
fn bench_subscribe_off_churn(c: &mut Criterion) {
    let bus: EventManager<u64> = EventManager::new();

    c.bench_function("subscribe_off_churn", |b| {
        b.iter(|| {
            for _ in 0..10 {
                bus.on("churn", |_v: &u64| {}).unwrap();
            }
            black_box(bus.off("churn").unwrap())
        })
    });
}

/// Benchmark latest with replay drained each iteration
fn bench_latest_replay(c: &mut Criterion) {
    let bus: EventManager<u64> = EventManager::new();
    bus.fire("status", 1).unwrap();

    c.bench_function("latest_replay", |b| {
        b.iter(|| {
            let handle = bus.latest("status", |_v: &u64| {}).unwrap();
            bus.run_pending();
            handle.unsubscribe();
        })
    });
}

/// Benchmark JSON payload fan-out
fn bench_json_fire(c: &mut Criterion) {
    let bus = JsonEventManager::new();
    for _ in 0..10 {
        bus.on("user.login", |v: &serde_json::Value| {
            black_box(v["user"].as_str());
        })
        .unwrap();
    }
    let payload = json!({"user": "ada", "roles": ["admin", "ops"], "attempt": 1});

    c.bench_function("json_fire", |b| {
        b.iter(|| bus.fire("user.login", payload.clone()).unwrap())
    });
}

criterion_group!(
    benches,
    bench_fire_fan_out,
    bench_fire_with_many_topics,
    bench_change_filter,
    bench_subscribe_off_churn,
    bench_latest_replay,
    bench_json_fire,
);
criterion_main!(benches);

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for the log store and instrumented calls.
//!
//! Run with: `cargo bench --bench log_store`

use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;

use calltrace::log_store::{InMemoryLogStore, LogRecord, LogStore, SharedLogStore, SqliteLogStore};
use calltrace::telemetry::CorrelationId;
use calltrace::tools::ToolRegistry;
use calltrace::types::CallContext;

fn sample_record(i: usize) -> LogRecord {
    LogRecord::success(
        CorrelationId::from_client(format!("bench_{i:06}")).unwrap(),
        if i % 2 == 0 { "echo" } else { "get_time" },
        Utc::now(),
        Duration::from_micros(250),
    )
}

/// Benchmark single appends on both backends.
fn bench_append(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let temp = TempDir::new().unwrap();
    let sqlite = SqliteLogStore::open_at(&temp.path().join("bench.db")).unwrap();
    let memory = InMemoryLogStore::new();

    let mut group = c.benchmark_group("log_store/append");
    group.throughput(Throughput::Elements(1));

    let mut i = 0usize;
    group.bench_function("sqlite", |b| {
        b.iter(|| {
            i += 1;
            rt.block_on(sqlite.append(black_box(&sample_record(i)))).unwrap();
        });
    });

    group.bench_function("memory", |b| {
        b.iter(|| {
            i += 1;
            rt.block_on(memory.append(black_box(&sample_record(i)))).unwrap();
        });
    });

    group.finish();
}

/// Benchmark queries against a pre-filled SQLite store.
fn bench_queries(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let temp = TempDir::new().unwrap();
    let store = SqliteLogStore::open_at(&temp.path().join("bench.db")).unwrap();

    rt.block_on(async {
        for i in 0..5_000 {
            store.append(&sample_record(i)).await.unwrap();
        }
    });

    let mut group = c.benchmark_group("log_store/query");

    group.bench_function("by_correlation_id", |b| {
        b.iter(|| {
            rt.block_on(store.query_by_correlation_id(black_box("bench_002500")))
                .unwrap()
        });
    });

    group.bench_function("latest_by_tool", |b| {
        b.iter(|| rt.block_on(store.query_latest_by_tool(black_box("echo"))).unwrap());
    });

    for limit in [10, 100] {
        group.bench_with_input(BenchmarkId::new("recent_by_tool", limit), &limit, |b, &limit| {
            b.iter(|| {
                rt.block_on(store.query_recent_by_tool(black_box("echo"), limit))
                    .unwrap()
            });
        });
    }

    group.bench_function("by_correlation_prefix", |b| {
        b.iter(|| {
            rt.block_on(store.query_by_correlation_prefix(black_box("bench_0049")))
                .unwrap()
        });
    });

    group.finish();
}

/// Benchmark an echo call with and without instrumentation.
fn bench_instrumented_call(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store: SharedLogStore = Arc::new(InMemoryLogStore::new());
    let plain = ToolRegistry::with_defaults();
    let instrumented = ToolRegistry::instrumented(store);
    let ctx = CallContext::with_correlation_id("bench_call");
    let input = serde_json::json!({"message": "hello"});

    let mut group = c.benchmark_group("tools/echo");

    group.bench_function("plain", |b| {
        b.iter(|| rt.block_on(plain.call("echo", &ctx, black_box(input.clone()))).unwrap());
    });

    group.bench_function("instrumented", |b| {
        b.iter(|| {
            rt.block_on(instrumented.call("echo", &ctx, black_box(input.clone())))
                .unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_append, bench_queries, bench_instrumented_call);

criterion_main!(benches);

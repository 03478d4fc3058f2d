// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Process-wide counters for tool calls and the log store.
//!
//! This is also the operational error channel: records that could not be
//! persisted are counted here instead of failing the call that produced them.
//! `calltrace call --metrics` prints [`MetricsSnapshot::format_report`].

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Upper bounds of the latency buckets, in microseconds. One overflow bucket follows.
const LATENCY_BOUNDS_MICROS: [u64; 6] = [100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000];

#[derive(Debug)]
pub struct Metrics {
    tools: RwLock<HashMap<String, ToolMetrics>>,
    operations: RwLock<HashMap<String, OperationMetrics>>,
    persisted: AtomicU64,
    retries: AtomicU64,
    lost: AtomicU64,
    started: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            operations: RwLock::new(HashMap::new()),
            persisted: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            lost: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Count one finished tool call.
    pub fn record_tool(&self, name: &str, duration: Duration, success: bool) {
        let mut tools = self.tools.write().unwrap_or_else(|e| e.into_inner());
        tools.entry(name.to_string()).or_default().record(duration, success);
    }

    /// Time one store operation, e.g. `log_store.sqlite.append`.
    pub fn record_operation(&self, name: &str, duration: Duration) {
        let mut ops = self.operations.write().unwrap_or_else(|e| e.into_inner());
        ops.entry(name.to_string()).or_default().record(duration);
    }

    /// A log record was durably appended.
    pub fn record_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    /// An append was retried after transient contention.
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// A log record was dropped after the store gave up.
    pub fn record_lost(&self) {
        self.lost.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tool_metrics(&self, name: &str) -> Option<ToolMetrics> {
        self.tools
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .cloned()
    }

    /// (persisted, retries, lost)
    pub fn record_counts(&self) -> (u64, u64, u64) {
        (
            self.persisted.load(Ordering::Relaxed),
            self.retries.load(Ordering::Relaxed),
            self.lost.load(Ordering::Relaxed),
        )
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let (records_persisted, append_retries, records_lost) = self.record_counts();
        MetricsSnapshot {
            tools: self.tools.read().unwrap_or_else(|e| e.into_inner()).clone(),
            operations: self.operations.read().unwrap_or_else(|e| e.into_inner()).clone(),
            records_persisted,
            append_retries,
            records_lost,
            uptime: self.started.elapsed(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome counts and timings for one tool.
#[derive(Debug, Clone, Default)]
pub struct ToolMetrics {
    pub invocations: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
}

impl ToolMetrics {
    pub fn record(&mut self, duration: Duration, success: bool) {
        self.invocations += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.total_duration += duration;
        self.max_duration = self.max_duration.max(duration);
    }

    pub fn avg_duration(&self) -> Duration {
        average(self.total_duration, self.invocations)
    }

    /// 0.0 to 1.0; a tool never called counts as fully successful.
    pub fn success_rate(&self) -> f64 {
        if self.invocations == 0 {
            1.0
        } else {
            self.successes as f64 / self.invocations as f64
        }
    }
}

/// Latency of one store operation.
#[derive(Debug, Clone, Default)]
pub struct OperationMetrics {
    pub count: u64,
    pub total_duration: Duration,
    pub latency: LatencyBuckets,
}

impl OperationMetrics {
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.latency.record(duration);
    }

    pub fn avg_duration(&self) -> Duration {
        average(self.total_duration, self.count)
    }
}

/// Fixed latency buckets, bounded by [`LATENCY_BOUNDS_MICROS`].
#[derive(Debug, Clone, Default)]
pub struct LatencyBuckets {
    counts: [u64; LATENCY_BOUNDS_MICROS.len() + 1],
}

impl LatencyBuckets {
    pub fn record(&mut self, duration: Duration) {
        let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
        let idx = LATENCY_BOUNDS_MICROS
            .iter()
            .position(|&bound| micros <= bound)
            .unwrap_or(LATENCY_BOUNDS_MICROS.len());
        self.counts[idx] += 1;
    }

    /// Upper bound of the bucket holding the `p`th percentile sample.
    ///
    /// Samples in the overflow bucket report ten times the largest bound.
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }
        let rank = ((total as f64 * p / 100.0).ceil() as u64).max(1);

        let mut seen = 0;
        for (idx, count) in self.counts.iter().enumerate() {
            seen += count;
            if seen >= rank {
                return Duration::from_micros(bucket_bound(idx));
            }
        }
        Duration::from_micros(bucket_bound(LATENCY_BOUNDS_MICROS.len()))
    }

    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

fn bucket_bound(idx: usize) -> u64 {
    LATENCY_BOUNDS_MICROS
        .get(idx)
        .copied()
        .unwrap_or(LATENCY_BOUNDS_MICROS[LATENCY_BOUNDS_MICROS.len() - 1] * 10)
}

fn average(total: Duration, count: u64) -> Duration {
    match u32::try_from(count) {
        Ok(0) => Duration::ZERO,
        Ok(n) => total / n,
        Err(_) => Duration::from_secs_f64(total.as_secs_f64() / count as f64),
    }
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub tools: HashMap<String, ToolMetrics>,
    pub operations: HashMap<String, OperationMetrics>,
    pub records_persisted: u64,
    pub append_retries: u64,
    pub records_lost: u64,
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Plain-text report, sections sorted by name.
    pub fn format_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "uptime {:.2?}", self.uptime);
        let _ = writeln!(
            out,
            "records: {} persisted, {} retries, {} lost",
            self.records_persisted, self.append_retries, self.records_lost
        );

        let mut tools: Vec<_> = self.tools.iter().collect();
        tools.sort_by(|a, b| a.0.cmp(b.0));
        for (name, m) in tools {
            let _ = writeln!(
                out,
                "tool {name}: {} calls, {:.1}% ok, avg {:.2?}, max {:.2?}",
                m.invocations,
                m.success_rate() * 100.0,
                m.avg_duration(),
                m.max_duration
            );
        }

        let mut ops: Vec<_> = self.operations.iter().collect();
        ops.sort_by(|a, b| a.0.cmp(b.0));
        for (name, m) in ops {
            let _ = writeln!(
                out,
                "op {name}: {} runs, avg {:.2?}, p99 <= {:.2?}",
                m.count,
                m.avg_duration(),
                m.latency.p99()
            );
        }

        out
    }
}

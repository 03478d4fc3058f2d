// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Telemetry: correlation identifiers, tracing setup, and metrics.
//!
//! - **Correlation IDs**: resolve or generate the identifier for each call
//! - **Tracing**: structured logging with one span per instrumented call
//! - **Metrics**: per-tool counters and the store's persisted/lost counters
//!
//! # Usage
//!
//! ```rust,ignore
//! use calltrace::telemetry::{init_telemetry, TelemetryConfig, Verbosity};
//!
//! let _guard = init_telemetry(&TelemetryConfig::for_cli("info", Verbosity::Normal))?;
//! ```

mod correlation;
mod init;
pub mod metrics;
mod spans;

pub use correlation::{
    resolve_correlation_id, CorrelationId, CorrelationIdExt, GENERATED_PREFIX, STARTUP_PREFIX,
    SUFFIX_LEN,
};
pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard, Verbosity};
pub use metrics::{
    LatencyBuckets, Metrics, MetricsSnapshot, OperationMetrics, ToolMetrics, GLOBAL_METRICS,
};
pub use spans::ToolSpan;

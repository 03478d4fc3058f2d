// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Call logging around any tool handler.
//!
//! [`InstrumentedTool`] resolves the call's correlation identifier, times the
//! inner handler, and appends one [`LogRecord`] per call. The inner result is
//! returned untouched; a failed append only shows up in logs and metrics.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{warn, Instrument};

use crate::error::ToolError;
use crate::log_store::{LogRecord, SharedLogStore};
use crate::telemetry::{resolve_correlation_id, CorrelationId, ToolSpan, GLOBAL_METRICS};
use crate::types::{CallContext, ToolDefinition};

use super::registry::{ToolHandler, ToolOutput};

/// `error_detail` of a record written for a call dropped mid-flight.
pub const CANCELLED_DETAIL: &str = "invocation cancelled before completion";

/// Wrap `inner` so every call is recorded in `store`.
pub fn instrument<H: ToolHandler>(inner: H, store: SharedLogStore) -> InstrumentedTool<H> {
    InstrumentedTool::new(inner, store)
}

/// A tool handler that logs each call of the handler it wraps.
pub struct InstrumentedTool<H> {
    inner: H,
    store: SharedLogStore,
    tool_name: String,
}

impl<H: ToolHandler> InstrumentedTool<H> {
    pub fn new(inner: H, store: SharedLogStore) -> Self {
        let tool_name = inner.definition().name;
        Self {
            inner,
            store,
            tool_name,
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: ToolHandler> ToolHandler for InstrumentedTool<H> {
    fn definition(&self) -> ToolDefinition {
        self.inner.definition()
    }

    fn is_mutating(&self) -> bool {
        self.inner.is_mutating()
    }

    async fn execute(
        &self,
        ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let correlation_id = resolve_correlation_id(ctx);
        let span = ToolSpan::start(&self.tool_name, &correlation_id);
        let started_at = Utc::now();
        let timer = Instant::now();

        let mut guard = CancelGuard {
            armed: Some((self.store.clone(), correlation_id.clone(), self.tool_name.clone())),
            started_at,
            timer,
        };

        let result = self
            .inner
            .execute(ctx, input)
            .instrument(span.span().clone())
            .await;

        let duration = timer.elapsed();
        guard.disarm();
        span.finish(duration, result.is_ok());

        let record =
            LogRecord::from_outcome(correlation_id, &self.tool_name, started_at, duration, &result);
        submit(&self.store, record).await;

        result
    }
}

/// Append a record, reporting failure only to the operational channel.
async fn submit(store: &SharedLogStore, record: LogRecord) {
    match store.append(&record).await {
        Ok(()) => GLOBAL_METRICS.record_persisted(),
        Err(err) => {
            GLOBAL_METRICS.record_lost();
            warn!(
                correlation_id = %record.correlation_id,
                tool = %record.tool_name,
                error = %err,
                "Failed to persist tool call record"
            );
        }
    }
}

/// Writes an error record if the call future is dropped before the inner
/// handler finishes.
struct CancelGuard {
    armed: Option<(SharedLogStore, CorrelationId, String)>,
    started_at: DateTime<Utc>,
    timer: Instant,
}

impl CancelGuard {
    fn disarm(&mut self) {
        self.armed = None;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        let Some((store, correlation_id, tool_name)) = self.armed.take() else {
            return;
        };

        let record = LogRecord::error(
            correlation_id,
            tool_name,
            self.started_at,
            self.timer.elapsed(),
            CANCELLED_DETAIL,
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { submit(&store, record).await });
            }
            Err(_) => {
                GLOBAL_METRICS.record_lost();
                warn!(
                    correlation_id = %record.correlation_id,
                    tool = %record.tool_name,
                    "No runtime to record cancelled call"
                );
            }
        }
    }
}

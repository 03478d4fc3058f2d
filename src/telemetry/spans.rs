// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Span helpers for instrumented tool calls.

use std::time::Duration;
use tracing::{info_span, Span};

use super::correlation::{CorrelationId, CorrelationIdExt};

/// Span covering one instrumented tool call.
///
/// The tool future runs inside [`ToolSpan::span`]; [`ToolSpan::finish`]
/// records the outcome on the span and in the global tool metrics.
pub struct ToolSpan {
    tool_name: String,
    span: Span,
}

impl ToolSpan {
    /// Open the span for a call to `tool_name`.
    pub fn start(tool_name: &str, correlation_id: &CorrelationId) -> Self {
        let span = info_span!(
            "tool",
            tool = %tool_name,
            correlation_id = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            success = tracing::field::Empty,
        );
        span.record_correlation_id(correlation_id);

        Self {
            tool_name: tool_name.to_string(),
            span,
        }
    }

    /// Get the underlying tracing span.
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Record the measured duration and outcome.
    pub fn finish(self, duration: Duration, success: bool) {
        self.span.record("duration_ms", duration.as_secs_f64() * 1000.0);
        self.span.record("success", success);

        super::metrics::GLOBAL_METRICS.record_tool(&self.tool_name, duration, success);

        tracing::debug!(parent: &self.span, "Tool call complete");
    }
}

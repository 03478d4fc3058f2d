// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Current-time tool handler.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

use crate::error::ToolError;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::types::{CallContext, ToolDefinition};

/// Handler for the `get_time` tool.
pub struct GetTimeHandler;

#[async_trait]
impl ToolHandler for GetTimeHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("get_time", "Get the current UTC time (RFC 3339)")
    }

    async fn execute(
        &self,
        _ctx: &CallContext,
        _input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        Ok(ToolOutput::success(
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn test_get_time_is_rfc3339() {
        let output = GetTimeHandler
            .execute(&CallContext::new(), serde_json::json!({}))
            .await
            .unwrap();
        let parsed = DateTime::parse_from_rfc3339(output.content()).unwrap();
        let skew = Utc::now().signed_duration_since(parsed).num_seconds().abs();
        assert!(skew < 5);
    }
}

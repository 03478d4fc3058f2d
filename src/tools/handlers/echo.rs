// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Echo tool handler.

use async_trait::async_trait;
use serde::Deserialize;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::ToolError;
use crate::tools::parse_arguments;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::types::{CallContext, InputSchema, ToolDefinition};

/// Handler for the `echo` tool.
pub struct EchoHandler;

#[derive(Debug, Deserialize)]
struct EchoArgs {
    message: String,
}

#[async_trait]
impl ToolHandler for EchoHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("echo", "Echo the provided message back to the caller").with_schema(
            InputSchema::new()
                .with_property(
                    "message",
                    serde_json::json!({
                        "type": "string",
                        "description": "Message to echo back"
                    }),
                )
                .with_required(vec!["message".to_string()]),
        )
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all))]
    async fn execute(
        &self,
        _ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let args: EchoArgs = parse_arguments(&input)?;
        Ok(ToolOutput::success(format!("Echo: {}", args.message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo() {
        let output = EchoHandler
            .execute(&CallContext::new(), serde_json::json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(output.content(), "Echo: hi");
    }

    #[tokio::test]
    async fn test_echo_requires_message() {
        let result = EchoHandler
            .execute(&CallContext::new(), serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
    }
}

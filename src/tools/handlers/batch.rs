// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Batch string transformation tool handler.
//!
//! Registered as a parallel tool, so callers send
//! `{"kwargs_list": [{"items": [...], "operation": "upper"}, ...]}`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

#[cfg(feature = "telemetry")]
use tracing::{debug, instrument};

use crate::error::ToolError;
use crate::tools::parse_arguments;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::types::{CallContext, InputSchema, ToolDefinition};

/// Handler for the `process_batch_data` tool.
pub struct BatchDataHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Operation {
    Upper,
    Lower,
    Reverse,
}

impl Operation {
    fn apply(self, item: &str) -> String {
        match self {
            Self::Upper => item.to_uppercase(),
            Self::Lower => item.to_lowercase(),
            Self::Reverse => item.chars().rev().collect(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Reverse => "reverse",
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchArgs {
    items: Vec<String>,
    #[serde(default = "default_operation")]
    operation: Operation,
}

fn default_operation() -> Operation {
    Operation::Upper
}

#[async_trait]
impl ToolHandler for BatchDataHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("process_batch_data", "Transform a list of strings").with_schema(
            InputSchema::new()
                .with_property(
                    "items",
                    json!({
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Strings to transform"
                    }),
                )
                .with_property(
                    "operation",
                    json!({
                        "type": "string",
                        "enum": ["upper", "lower", "reverse"],
                        "description": "Transformation to apply (default: upper)"
                    }),
                )
                .with_required(vec!["items".to_string()]),
        )
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, fields(items)))]
    async fn execute(
        &self,
        _ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let args: BatchArgs = parse_arguments(&input)?;

        #[cfg(feature = "telemetry")]
        tracing::Span::current().record("items", args.items.len());

        let results: Vec<String> = args
            .items
            .iter()
            .map(|item| args.operation.apply(item))
            .collect();

        #[cfg(feature = "telemetry")]
        debug!(operation = args.operation.as_str(), "Batch processed");

        Ok(ToolOutput::json(json!({
            "operation": args.operation.as_str(),
            "count": results.len(),
            "results": results,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        BatchDataHandler
            .execute(&CallContext::new(), input)
            .await
            .map(|o| o.to_value())
    }

    #[tokio::test]
    async fn test_operations() {
        let upper = run(json!({"items": ["ab", "Cd"]})).await.unwrap();
        assert_eq!(upper["results"], json!(["AB", "CD"]));
        assert_eq!(upper["count"], 2);

        let lower = run(json!({"items": ["AB"], "operation": "lower"})).await.unwrap();
        assert_eq!(lower["results"], json!(["ab"]));

        let reverse = run(json!({"items": ["héllo"], "operation": "reverse"})).await.unwrap();
        assert_eq!(reverse["results"], json!(["olléh"]));
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let result = run(json!({"items": ["a"], "operation": "shuffle"})).await;
        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
    }
}

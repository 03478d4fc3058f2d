// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Random number tool handler.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ToolError;
use crate::tools::parse_arguments;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::types::{CallContext, InputSchema, ToolDefinition};

/// Handler for the `random_number` tool.
pub struct RandomNumberHandler;

#[derive(Debug, Deserialize)]
struct RandomArgs {
    #[serde(default = "default_min")]
    min_value: i64,
    #[serde(default = "default_max")]
    max_value: i64,
}

fn default_min() -> i64 {
    1
}

fn default_max() -> i64 {
    100
}

/// Uniform-enough draw from `[min, max]` using the v4 UUID random source.
fn draw(min: i64, max: i64) -> i64 {
    let span = (max as i128 - min as i128 + 1) as u128;
    let offset = Uuid::new_v4().as_u128() % span;
    (min as i128 + offset as i128) as i64
}

#[async_trait]
impl ToolHandler for RandomNumberHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("random_number", "Generate a random integer in a range").with_schema(
            InputSchema::new()
                .with_property(
                    "min_value",
                    json!({"type": "integer", "description": "Lower bound, inclusive (default: 1)"}),
                )
                .with_property(
                    "max_value",
                    json!({"type": "integer", "description": "Upper bound, inclusive (default: 100)"}),
                ),
        )
    }

    async fn execute(
        &self,
        _ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let args: RandomArgs = parse_arguments(&input)?;
        if args.min_value > args.max_value {
            return Err(ToolError::InvalidInput(format!(
                "min_value ({}) must not exceed max_value ({})",
                args.min_value, args.max_value
            )));
        }

        let number = draw(args.min_value, args.max_value);
        Ok(ToolOutput::json(json!({
            "number": number,
            "range": [args.min_value, args.max_value],
        })))
    }
}

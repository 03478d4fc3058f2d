// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fibonacci tool handler.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::ToolError;
use crate::tools::parse_arguments;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::types::{CallContext, InputSchema, ToolDefinition};

/// Largest position whose value fits in a `u128`.
pub const MAX_FIBONACCI_N: u32 = 186;

/// Handler for the `calculate_fibonacci` tool.
pub struct FibonacciHandler;

#[derive(Debug, Deserialize)]
struct FibonacciArgs {
    n: u32,
}

fn fibonacci(n: u32) -> u128 {
    if n == 0 {
        return 0;
    }
    let (mut a, mut b) = (0u128, 1u128);
    for _ in 1..n {
        let next = a + b;
        a = b;
        b = next;
    }
    b
}

#[async_trait]
impl ToolHandler for FibonacciHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("calculate_fibonacci", "Calculate the n-th Fibonacci number").with_schema(
            InputSchema::new()
                .with_property(
                    "n",
                    json!({"type": "integer", "description": "Position, 0 to 186"}),
                )
                .with_required(vec!["n".to_string()]),
        )
    }

    async fn execute(
        &self,
        _ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let args: FibonacciArgs = parse_arguments(&input)?;
        if args.n > MAX_FIBONACCI_N {
            return Err(ToolError::InvalidInput(format!(
                "n must be at most {MAX_FIBONACCI_N}, got {}",
                args.n
            )));
        }

        // u128 exceeds JSON's safe integer range, so the value is a string.
        Ok(ToolOutput::json(json!({
            "position": args.n,
            "value": fibonacci(args.n).to_string(),
        })))
    }
}

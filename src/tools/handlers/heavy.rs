// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Simulated slow computation, for exercising timing and parallel runs.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::ToolError;
use crate::log_store::duration_to_ms;
use crate::tools::parse_arguments;
use crate::tools::registry::{ToolHandler, ToolOutput};
use crate::types::{CallContext, InputSchema, ToolDefinition};

const MIN_COMPLEXITY: u32 = 1;
const MAX_COMPLEXITY: u32 = 10;
const STEP_DELAY_MS: u64 = 10;

/// Handler for the `simulate_heavy_computation` tool.
pub struct HeavyComputationHandler;

#[derive(Debug, Deserialize)]
struct HeavyArgs {
    #[serde(default = "default_complexity")]
    complexity: u32,
}

fn default_complexity() -> u32 {
    5
}

#[async_trait]
impl ToolHandler for HeavyComputationHandler {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "simulate_heavy_computation",
            "Simulate a slow computation; runtime grows with complexity",
        )
        .with_schema(InputSchema::new().with_property(
            "complexity",
            json!({"type": "integer", "description": "Work factor, 1 to 10 (default: 5)"}),
        ))
    }

    async fn execute(
        &self,
        _ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let args: HeavyArgs = parse_arguments(&input)?;
        if !(MIN_COMPLEXITY..=MAX_COMPLEXITY).contains(&args.complexity) {
            return Err(ToolError::InvalidInput(format!(
                "complexity must be between {MIN_COMPLEXITY} and {MAX_COMPLEXITY}, got {}",
                args.complexity
            )));
        }

        let start = Instant::now();
        tokio::time::sleep(Duration::from_millis(
            u64::from(args.complexity) * STEP_DELAY_MS,
        ))
        .await;

        let iterations = u64::from(args.complexity) * 1_000;
        let checksum = (1..=iterations).fold(0u64, |acc, i| acc.wrapping_add(i * i) % 1_000_007);

        Ok(ToolOutput::json(json!({
            "complexity": args.complexity,
            "iterations": iterations,
            "checksum": checksum,
            "elapsed_ms": duration_to_ms(start.elapsed()),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleeps_proportional_to_complexity() {
        let output = HeavyComputationHandler
            .execute(&CallContext::new(), json!({"complexity": 3}))
            .await
            .unwrap()
            .to_value();

        assert_eq!(output["complexity"], 3);
        assert_eq!(output["iterations"], 3_000);
        assert!(output["elapsed_ms"].as_u64().unwrap() >= 30);
    }

    #[tokio::test]
    async fn test_complexity_bounds() {
        for complexity in [0, 11] {
            let result = HeavyComputationHandler
                .execute(&CallContext::new(), json!({ "complexity": complexity }))
                .await;
            assert!(matches!(result, Err(ToolError::InvalidInput(_))));
        }
    }
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Batch execution of a tool over many argument sets.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinSet;

use crate::error::ToolError;
use crate::types::{CallContext, InputSchema, ToolDefinition};

use super::parse_arguments;
use super::registry::{ToolHandler, ToolOutput};

/// Argument holding the list of per-item argument objects.
pub const KWARGS_LIST: &str = "kwargs_list";

#[derive(Debug, Deserialize)]
struct BatchArgs {
    kwargs_list: Vec<Value>,
}

/// Runs the wrapped tool once per element of `kwargs_list`, concurrently.
///
/// Results come back as a JSON array in input order. If any element fails,
/// the call fails with the error of the lowest failing index.
pub struct Parallelized<H> {
    inner: Arc<H>,
}

impl<H: ToolHandler + 'static> Parallelized<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl<H: ToolHandler + 'static> ToolHandler for Parallelized<H> {
    fn definition(&self) -> ToolDefinition {
        let inner = self.inner.definition();
        let item_schema = serde_json::to_value(&inner.input_schema).unwrap_or_else(|_| json!({}));

        ToolDefinition::new(
            inner.name,
            format!("{} (runs each entry of kwargs_list in parallel)", inner.description),
        )
        .with_schema(
            InputSchema::new()
                .with_property(
                    KWARGS_LIST,
                    json!({
                        "type": "array",
                        "description": "Argument objects, one per parallel run",
                        "items": item_schema,
                    }),
                )
                .with_required(vec![KWARGS_LIST.to_string()]),
        )
    }

    fn is_mutating(&self) -> bool {
        self.inner.is_mutating()
    }

    async fn execute(&self, ctx: &CallContext, input: Value) -> Result<ToolOutput, ToolError> {
        let args: BatchArgs = parse_arguments(&input)?;
        if args.kwargs_list.is_empty() {
            return Err(ToolError::InvalidInput(format!("{KWARGS_LIST} must not be empty")));
        }

        let total = args.kwargs_list.len();
        let mut tasks = JoinSet::new();
        for (index, item) in args.kwargs_list.into_iter().enumerate() {
            let inner = Arc::clone(&self.inner);
            let ctx = ctx.clone();
            tasks.spawn(async move { (index, inner.execute(&ctx, item).await) });
        }

        let mut results: Vec<Option<Result<ToolOutput, ToolError>>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) =
                joined.map_err(|e| ToolError::Internal(format!("Batch task failed: {e}")))?;
            results[index] = Some(result);
        }

        let mut values = Vec::with_capacity(total);
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Some(Ok(output)) => values.push(output.to_value()),
                Some(Err(err)) => {
                    return Err(ToolError::ExecutionFailed(format!("item {index}: {err}")));
                }
                None => {
                    return Err(ToolError::Internal(format!("item {index}: no result")));
                }
            }
        }

        Ok(ToolOutput::json(Value::Array(values)))
    }
}

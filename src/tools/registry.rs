// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool registry and handler trait.
//!
//! This module defines the core abstractions for the tool system:
//! - [`ToolHandler`] trait that all tools must implement
//! - [`ToolRegistry`] for looking up and dispatching tool calls
//! - [`ToolOutput`] for returning results from tool execution
//!
//! Handlers are wrapped once, when they are registered, so every lookup
//! returns the fully decorated handler.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "telemetry")]
use tracing::debug;

use crate::error::ToolError;
use crate::log_store::SharedLogStore;
use crate::telemetry::{resolve_correlation_id, CorrelationId};
use crate::types::{CallContext, ToolDefinition};

use super::convert::TypeConverted;
use super::instrument::instrument;
use super::parallel::Parallelized;

/// Output from executing a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Simple text content result
    Text {
        content: String,
        success: bool,
    },
    /// Structured result; `content` is the JSON rendering of `metadata`
    Structured {
        content: String,
        success: bool,
        metadata: Option<serde_json::Value>,
    },
}

impl ToolOutput {
    /// Create a successful text output.
    pub fn success(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            success: true,
        }
    }

    /// Create an error text output.
    pub fn error(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            success: false,
        }
    }

    /// Create a successful structured output from a JSON value.
    pub fn json(value: serde_json::Value) -> Self {
        Self::Structured {
            content: value.to_string(),
            success: true,
            metadata: Some(value),
        }
    }

    /// Get the content string.
    pub fn content(&self) -> &str {
        match self {
            Self::Text { content, .. } => content,
            Self::Structured { content, .. } => content,
        }
    }

    /// Check if the output indicates success.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Text { success, .. } => *success,
            Self::Structured { success, .. } => *success,
        }
    }

    /// JSON view of the output: the structured value, or the text as a string.
    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::Structured {
                metadata: Some(value),
                ..
            } => value.clone(),
            other => serde_json::Value::String(other.content().to_string()),
        }
    }
}

impl From<ToolError> for ToolOutput {
    fn from(err: ToolError) -> Self {
        Self::error(err.to_string())
    }
}

/// Trait that all tool handlers must implement.
///
/// # Example
///
/// ```rust,ignore
/// use calltrace::tools::{ToolHandler, ToolOutput};
/// use calltrace::types::{CallContext, ToolDefinition};
///
/// struct MyTool;
///
/// #[async_trait]
/// impl ToolHandler for MyTool {
///     fn definition(&self) -> ToolDefinition {
///         ToolDefinition::new("my_tool", "Does something useful")
///     }
///
///     async fn execute(
///         &self,
///         _ctx: &CallContext,
///         input: serde_json::Value,
///     ) -> Result<ToolOutput, ToolError> {
///         Ok(ToolOutput::success("Done!"))
///     }
/// }
/// ```
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Get the tool definition (name, description, input schema).
    fn definition(&self) -> ToolDefinition;

    /// Returns true if this tool may mutate the environment.
    fn is_mutating(&self) -> bool {
        false
    }

    /// Execute the tool with the call's metadata and input parameters.
    async fn execute(
        &self,
        ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError>;
}

#[async_trait]
impl<T: ToolHandler + ?Sized> ToolHandler for Arc<T> {
    fn definition(&self) -> ToolDefinition {
        (**self).definition()
    }

    fn is_mutating(&self) -> bool {
        (**self).is_mutating()
    }

    async fn execute(
        &self,
        ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        (**self).execute(ctx, input).await
    }
}

/// Registry of available tools, maps names to handlers.
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Create a registry with the built-in tools, without call logging.
    pub fn with_defaults() -> Self {
        let mut builder = ToolRegistryBuilder::new();
        builder.register_defaults();
        builder.build()
    }

    /// Create a registry with the built-in tools, logging every call to `store`.
    pub fn instrumented(store: SharedLogStore) -> Self {
        let mut builder = ToolRegistryBuilder::new().with_store(store);
        builder.register_defaults();
        builder.build()
    }

    /// Get a handler by tool name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Get all tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.handlers.values().map(|h| h.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Get all tool names, sorted.
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Call a tool and return its own result.
    pub async fn call(
        &self,
        tool_name: &str,
        ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let handler = self
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        handler.execute(ctx, input).await
    }

    /// Dispatch a tool call and turn tool failures into an error response.
    ///
    /// The correlation identifier is resolved here and pinned in the context
    /// handed to the handler, so the result names the identifier the call was
    /// logged under. Only an unknown tool name is returned as `Err`.
    pub async fn dispatch(
        &self,
        tool_name: &str,
        ctx: &CallContext,
        input: serde_json::Value,
    ) -> Result<DispatchResult, ToolError> {
        let handler = self
            .get(tool_name)
            .ok_or_else(|| ToolError::NotFound(tool_name.to_string()))?;

        let correlation_id = resolve_correlation_id(ctx);
        let pinned = CallContext::with_correlation_id(correlation_id.as_str());

        #[cfg(feature = "telemetry")]
        debug!(tool = %tool_name, correlation_id = %correlation_id, "Executing tool");

        let start = Instant::now();
        let result = handler.execute(&pinned, input).await;
        let duration = start.elapsed();

        match result {
            Ok(output) => {
                #[cfg(feature = "telemetry")]
                debug!(
                    tool = %tool_name,
                    duration_ms = duration.as_secs_f64() * 1000.0,
                    "Tool execution succeeded"
                );
                Ok(DispatchResult {
                    tool_name: tool_name.to_string(),
                    correlation_id,
                    output,
                    duration,
                    is_error: false,
                })
            }
            Err(err) => {
                #[cfg(feature = "telemetry")]
                debug!(
                    tool = %tool_name,
                    duration_ms = duration.as_secs_f64() * 1000.0,
                    error = %err,
                    "Tool execution failed"
                );
                Ok(DispatchResult {
                    tool_name: tool_name.to_string(),
                    correlation_id,
                    output: ToolOutput::from(err),
                    duration,
                    is_error: true,
                })
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of dispatching a tool call.
#[derive(Debug)]
pub struct DispatchResult {
    /// Name of the tool that was called
    pub tool_name: String,
    /// Identifier the call was logged under
    pub correlation_id: CorrelationId,
    /// Output from the tool
    pub output: ToolOutput,
    /// Duration of execution
    pub duration: Duration,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

/// Builder for constructing a ToolRegistry.
///
/// Every handler is wrapped in argument conversion. With a store attached,
/// handlers registered afterwards are also instrumented.
pub struct ToolRegistryBuilder {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
    store: Option<SharedLogStore>,
}

impl ToolRegistryBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            store: None,
        }
    }

    /// Log every call of handlers registered from here on to `store`.
    pub fn with_store(mut self, store: SharedLogStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Register a tool handler.
    pub fn register<T: ToolHandler + 'static>(&mut self, handler: T) -> &mut Self {
        self.insert(TypeConverted::new(handler))
    }

    /// Register a tool that runs a batch of argument sets concurrently.
    pub fn register_parallel<T: ToolHandler + 'static>(&mut self, handler: T) -> &mut Self {
        self.insert(Parallelized::new(TypeConverted::new(handler)))
    }

    /// Register a tool handler (boxed version for dynamic registration).
    pub fn register_boxed(&mut self, handler: Arc<dyn ToolHandler>) -> &mut Self {
        self.insert(TypeConverted::new(handler))
    }

    /// Register the built-in tools.
    pub fn register_defaults(&mut self) -> &mut Self {
        self.register(super::handlers::EchoHandler);
        self.register(super::handlers::GetTimeHandler);
        self.register(super::handlers::RandomNumberHandler);
        self.register(super::handlers::FibonacciHandler);
        self.register_parallel(super::handlers::BatchDataHandler);
        self.register_parallel(super::handlers::HeavyComputationHandler);
        self
    }

    fn insert<T: ToolHandler + 'static>(&mut self, handler: T) -> &mut Self {
        let name = handler.definition().name;
        let wrapped: Arc<dyn ToolHandler> = match &self.store {
            Some(store) => Arc::new(instrument(handler, Arc::clone(store))),
            None => Arc::new(handler),
        };
        self.handlers.insert(name, wrapped);
        self
    }

    /// Build the final registry.
    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            handlers: self.handlers,
        }
    }
}

impl Default for ToolRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_store::{InMemoryLogStore, LogStore};

    struct MockTool {
        name: String,
        fail: bool,
    }

    #[async_trait]
    impl ToolHandler for MockTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(&self.name, "A mock tool")
        }

        async fn execute(
            &self,
            _ctx: &CallContext,
            _input: serde_json::Value,
        ) -> Result<ToolOutput, ToolError> {
            if self.fail {
                Err(ToolError::ExecutionFailed("mock failure".to_string()))
            } else {
                Ok(ToolOutput::success("mock result"))
            }
        }
    }

    fn mock(name: &str, fail: bool) -> MockTool {
        MockTool {
            name: name.to_string(),
            fail,
        }
    }

    #[test]
    fn test_tool_output_success() {
        let output = ToolOutput::success("test");
        assert!(output.is_success());
        assert_eq!(output.content(), "test");
        assert_eq!(output.to_value(), serde_json::json!("test"));
    }

    #[test]
    fn test_tool_output_json() {
        let output = ToolOutput::json(serde_json::json!({"value": 8}));
        assert!(output.is_success());
        assert_eq!(output.content(), r#"{"value":8}"#);
        assert_eq!(output.to_value()["value"], 8);
    }

    #[test]
    fn test_tool_output_from_error() {
        let output = ToolOutput::from(ToolError::MissingParameter("n".to_string()));
        assert!(!output.is_success());
        assert_eq!(output.content(), "Missing required parameter: n");
    }

    #[test]
    fn test_registry_builder() {
        let mut builder = ToolRegistryBuilder::new();
        builder.register(mock("mock1", false));
        builder.register(mock("mock2", true));

        let registry = builder.build();
        assert!(registry.contains("mock1"));
        assert!(registry.contains("mock2"));
        assert!(!registry.contains("mock3"));
        assert_eq!(registry.tool_names(), vec!["mock1", "mock2"]);
    }

    #[test]
    fn test_default_tools() {
        let registry = ToolRegistry::with_defaults();
        assert_eq!(
            registry.tool_names(),
            vec![
                "calculate_fibonacci",
                "echo",
                "get_time",
                "process_batch_data",
                "random_number",
                "simulate_heavy_computation",
            ]
        );
        assert_eq!(registry.definitions().len(), 6);
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut builder = ToolRegistryBuilder::new();
        builder.register(mock("test_tool", false));

        let registry = builder.build();
        let result = registry
            .dispatch("test_tool", &CallContext::new(), serde_json::json!({}))
            .await
            .unwrap();

        assert_eq!(result.tool_name, "test_tool");
        assert!(result.output.is_success());
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_dispatch_reports_logged_identifier() {
        let store = Arc::new(InMemoryLogStore::new());
        let mut builder = ToolRegistryBuilder::new().with_store(store.clone());
        builder.register(mock("logged", false));
        let registry = builder.build();

        let generated = registry
            .dispatch("logged", &CallContext::new(), serde_json::json!({}))
            .await
            .unwrap();
        assert!(generated.correlation_id.is_generated());

        let supplied = registry
            .dispatch(
                "logged",
                &CallContext::with_correlation_id("client_7"),
                serde_json::json!({}),
            )
            .await
            .unwrap();
        assert_eq!(supplied.correlation_id.as_str(), "client_7");

        let records = store
            .query_by_correlation_id(generated.correlation_id.as_str())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tool_name, "logged");
    }

    #[tokio::test]
    async fn test_dispatch_converts_failure_to_error_response() {
        let mut builder = ToolRegistryBuilder::new();
        builder.register(mock("broken", true));

        let registry = builder.build();
        let result = registry
            .dispatch("broken", &CallContext::new(), serde_json::json!({}))
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(!result.output.is_success());
        assert!(result.output.content().contains("mock failure"));
    }

    #[tokio::test]
    async fn test_call_passes_failure_through() {
        let mut builder = ToolRegistryBuilder::new();
        builder.register(mock("broken", true));

        let err = builder
            .build()
            .call("broken", &CallContext::new(), serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err, ToolError::ExecutionFailed("mock failure".to_string()));
    }

    #[tokio::test]
    async fn test_registry_dispatch_not_found() {
        let registry = ToolRegistry::new();
        let result = registry
            .dispatch("nonexistent", &CallContext::new(), serde_json::json!({}))
            .await;

        assert!(matches!(result.unwrap_err(), ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_with_store_instruments_registered_tools() {
        let store = Arc::new(InMemoryLogStore::new());
        let mut builder = ToolRegistryBuilder::new().with_store(store.clone());
        builder.register(mock("logged", false));
        let registry = builder.build();

        registry
            .call(
                "logged",
                &CallContext::with_correlation_id("builder_case"),
                serde_json::json!({}),
            )
            .await
            .unwrap();

        let records = store.query_by_correlation_id("builder_case").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tool_name, "logged");
    }
}

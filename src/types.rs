// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core type definitions shared by tools, the registry, and the log store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Call Context
// ============================================================================

/// Metadata keys that may carry a client-supplied correlation identifier.
pub const CORRELATION_META_KEYS: &[&str] = &["correlation_id", "correlationId"];

/// Per-call metadata delivered alongside the tool arguments.
///
/// The transport layer fills this in; the core only ever reads the
/// correlation field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl CallContext {
    /// Context with no client metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying a client-supplied correlation identifier.
    pub fn with_correlation_id(id: impl Into<String>) -> Self {
        Self {
            correlation_id: Some(id.into()),
        }
    }

    /// Build a context from a request's `_meta` object.
    ///
    /// Non-string values are ignored.
    pub fn from_meta(meta: &serde_json::Value) -> Self {
        let correlation_id = CORRELATION_META_KEYS
            .iter()
            .find_map(|key| meta.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string);

        Self { correlation_id }
    }

    /// The correlation field, if present and non-empty after trimming.
    pub fn supplied_correlation_id(&self) -> Option<&str> {
        self.correlation_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

// ============================================================================
// Tool Definitions
// ============================================================================

/// JSON Schema for tool input parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String, // Always "object"
    pub properties: HashMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl InputSchema {
    /// Create a new input schema with object type.
    pub fn new() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: None,
        }
    }

    /// Add a property to the schema.
    pub fn with_property(mut self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    /// Mark properties as required.
    pub fn with_required(mut self, required: Vec<String>) -> Self {
        self.required = Some(required);
        self
    }

    /// Declared JSON type of a property, if any.
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.properties
            .get(name)
            .and_then(|schema| schema.get("type"))
            .and_then(|t| t.as_str())
    }
}

impl Default for InputSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Definition of a tool exposed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: InputSchema::new(),
        }
    }

    /// Set the input schema for this tool.
    pub fn with_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = schema;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_context_supplied_id() {
        let ctx = CallContext::with_correlation_id("test_echo_abc123");
        assert_eq!(ctx.supplied_correlation_id(), Some("test_echo_abc123"));
    }

    #[test]
    fn test_call_context_blank_id_is_absent() {
        assert_eq!(CallContext::with_correlation_id("").supplied_correlation_id(), None);
        assert_eq!(CallContext::with_correlation_id("   ").supplied_correlation_id(), None);
        assert_eq!(CallContext::new().supplied_correlation_id(), None);
    }

    #[test]
    fn test_call_context_keeps_surrounding_whitespace() {
        let ctx = CallContext::with_correlation_id(" abc ");
        assert_eq!(ctx.supplied_correlation_id(), Some(" abc "));
    }

    #[test]
    fn test_call_context_from_meta() {
        let ctx = CallContext::from_meta(&json!({"correlation_id": "abc"}));
        assert_eq!(ctx.correlation_id.as_deref(), Some("abc"));

        let ctx = CallContext::from_meta(&json!({"correlationId": "xyz"}));
        assert_eq!(ctx.correlation_id.as_deref(), Some("xyz"));

        let ctx = CallContext::from_meta(&json!({"correlation_id": 42}));
        assert!(ctx.correlation_id.is_none());
    }

    #[test]
    fn test_input_schema_property_type() {
        let schema = InputSchema::new()
            .with_property("n", json!({"type": "integer"}))
            .with_required(vec!["n".to_string()]);
        assert_eq!(schema.property_type("n"), Some("integer"));
        assert_eq!(schema.property_type("missing"), None);
    }

    #[test]
    fn test_tool_definition_serde() {
        let def = ToolDefinition::new("echo", "Echo a message");
        let json = serde_json::to_value(&def).unwrap();
        assert_eq!(json["name"], "echo");
        assert_eq!(json["input_schema"]["type"], "object");
    }
}

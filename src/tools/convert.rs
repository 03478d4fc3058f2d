// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Argument coercion driven by a tool's input schema.

use async_trait::async_trait;
use serde_json::{Number, Value};

use crate::error::ToolError;
use crate::types::{CallContext, InputSchema, ToolDefinition};

use super::registry::{ToolHandler, ToolOutput};

/// Coerces string arguments to the types declared in the wrapped tool's schema.
///
/// Clients that send every argument as a string (`"n": "10"`) still reach the
/// handler with typed values. Strings that don't parse are left as they are,
/// so the handler reports its own validation error.
pub struct TypeConverted<H> {
    inner: H,
    schema: InputSchema,
}

impl<H: ToolHandler> TypeConverted<H> {
    pub fn new(inner: H) -> Self {
        let schema = inner.definition().input_schema;
        Self { inner, schema }
    }
}

#[async_trait]
impl<H: ToolHandler> ToolHandler for TypeConverted<H> {
    fn definition(&self) -> ToolDefinition {
        self.inner.definition()
    }

    fn is_mutating(&self) -> bool {
        self.inner.is_mutating()
    }

    async fn execute(&self, ctx: &CallContext, input: Value) -> Result<ToolOutput, ToolError> {
        self.inner.execute(ctx, convert_arguments(&self.schema, input)).await
    }
}

/// Coerce each top-level string argument to its declared type.
pub fn convert_arguments(schema: &InputSchema, input: Value) -> Value {
    let Value::Object(mut args) = input else {
        return input;
    };

    for (name, value) in args.iter_mut() {
        let Some(declared) = schema.property_type(name) else {
            continue;
        };
        if let Value::String(raw) = value {
            if let Some(converted) = coerce(raw, declared) {
                *value = converted;
            }
        }
    }

    Value::Object(args)
}

fn coerce(raw: &str, declared: &str) -> Option<Value> {
    let trimmed = raw.trim();
    match declared {
        "integer" => trimmed.parse::<i64>().ok().map(Value::from),
        "number" => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        "boolean" => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        "array" => serde_json::from_str::<Value>(trimmed)
            .ok()
            .filter(Value::is_array),
        "object" => serde_json::from_str::<Value>(trimmed)
            .ok()
            .filter(Value::is_object),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> InputSchema {
        InputSchema::new()
            .with_property("n", json!({"type": "integer"}))
            .with_property("ratio", json!({"type": "number"}))
            .with_property("flag", json!({"type": "boolean"}))
            .with_property("items", json!({"type": "array"}))
            .with_property("message", json!({"type": "string"}))
    }

    #[test]
    fn test_converts_declared_types() {
        let converted = convert_arguments(
            &schema(),
            json!({
                "n": " 42 ",
                "ratio": "0.5",
                "flag": "TRUE",
                "items": "[\"a\", \"b\"]",
                "message": "7",
            }),
        );

        assert_eq!(converted["n"], json!(42));
        assert_eq!(converted["ratio"], json!(0.5));
        assert_eq!(converted["flag"], json!(true));
        assert_eq!(converted["items"], json!(["a", "b"]));
        assert_eq!(converted["message"], json!("7"));
    }

    #[test]
    fn test_leaves_unparseable_and_typed_values() {
        let converted = convert_arguments(
            &schema(),
            json!({"n": "ten", "flag": false, "items": "{}", "extra": "1"}),
        );

        assert_eq!(converted["n"], json!("ten"));
        assert_eq!(converted["flag"], json!(false));
        assert_eq!(converted["items"], json!("{}"));
        assert_eq!(converted["extra"], json!("1"));
    }

    #[test]
    fn test_non_object_input_untouched() {
        assert_eq!(convert_arguments(&schema(), json!("raw")), json!("raw"));
        assert_eq!(convert_arguments(&schema(), Value::Null), Value::Null);
    }
}

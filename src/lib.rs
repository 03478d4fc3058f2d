// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! calltrace - correlated call logging for tool servers.
//!
//! Every tool call gets a correlation identifier (the client's, or a fresh
//! `req_` + 12 character one), is timed, and leaves exactly one record in a
//! queryable log store. The tool's own result is never changed by the
//! logging around it.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Call context and tool definitions
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Correlation identifiers, tracing, and metrics
//! - [`log_store`] - Durable record store (SQLite) and the in-memory store
//! - [`tools`] - Tool handlers, wrappers, and registry
//!
//! # Example
//!
//! ```rust,ignore
//! use calltrace::config::{load_config, CliOptions};
//! use calltrace::log_store::open_store;
//! use calltrace::tools::ToolRegistry;
//! use calltrace::types::CallContext;
//!
//! let config = load_config(Path::new("."), CliOptions::default())?;
//! let store = open_store(&config)?;
//! let registry = ToolRegistry::instrumented(store.clone());
//!
//! let ctx = CallContext::with_correlation_id("test_echo_abc123");
//! registry.call("echo", &ctx, json!({"message": "hi"})).await?;
//!
//! let records = store.query_by_correlation_id("test_echo_abc123").await?;
//! ```

pub mod config;
pub mod error;
pub mod log_store;
pub mod telemetry;
pub mod tools;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ConfigError, Result, StorageError, ToolError};
pub use log_store::{LogRecord, LogStatus, LogStore, SharedLogStore};
pub use telemetry::CorrelationId;
pub use tools::{ToolHandler, ToolOutput, ToolRegistry};
pub use types::{CallContext, ToolDefinition};

/// calltrace version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_public_exports() {
        let _ctx = CallContext::with_correlation_id("x");
        let _id = CorrelationId::generate();
        let _output = ToolOutput::success("ok");
    }
}

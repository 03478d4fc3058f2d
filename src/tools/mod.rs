// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool system for calltrace.
//!
//! # Architecture
//!
//! - [`ToolHandler`] trait - Core abstraction for tool implementations
//! - [`ToolRegistry`] - Maps tool names to handlers, dispatches calls
//! - Wrappers applied at registration: [`TypeConverted`], [`Parallelized`],
//!   and [`InstrumentedTool`] (outermost)
//! - Individual handlers in the [`handlers`] module
//!
//! # Example
//!
//! ```rust,ignore
//! use calltrace::tools::ToolRegistry;
//! use calltrace::types::CallContext;
//!
//! let registry = ToolRegistry::instrumented(store);
//! let ctx = CallContext::with_correlation_id("test_echo_abc123");
//! let output = registry.call("echo", &ctx, json!({"message": "hi"})).await?;
//! ```

pub mod convert;
pub mod handlers;
pub mod instrument;
pub mod parallel;
pub mod registry;

pub use convert::{convert_arguments, TypeConverted};
pub use handlers::*;
pub use instrument::{instrument, InstrumentedTool, CANCELLED_DETAIL};
pub use parallel::{Parallelized, KWARGS_LIST};
pub use registry::{DispatchResult, ToolHandler, ToolOutput, ToolRegistry, ToolRegistryBuilder};

use crate::error::ToolError;
use serde::Deserialize;

/// Parse JSON arguments into a typed struct.
pub fn parse_arguments<T>(arguments: &serde_json::Value) -> Result<T, ToolError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(arguments.clone())
        .map_err(|err| ToolError::InvalidInput(format!("Failed to parse arguments: {err}")))
}

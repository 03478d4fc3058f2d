// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for calltrace.
//!
//! Tool-domain errors ([`ToolError`]) always flow back to the caller untouched.
//! Storage-domain errors ([`StorageError`]) stay inside the instrumentation layer
//! and only surface through logs and metrics.

use thiserror::Error;

/// Errors that can occur during tool execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Errors that can occur while persisting or querying log records.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Database locked: {0}")]
    Locked(String),

    #[error("Storage IO error: {0}")]
    Io(String),

    #[error("SQLite error: {0}")]
    Sqlite(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Internal storage error: {0}")]
    Internal(String),

    #[error("Append failed after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: Box<StorageError> },
}

impl StorageError {
    /// Transient contention that is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::Locked(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::DatabaseBusy => Self::Busy(err.to_string()),
                ErrorCode::DatabaseLocked => Self::Locked(err.to_string()),
                ErrorCode::DiskFull | ErrorCode::SystemIoFailure | ErrorCode::CannotOpen => {
                    Self::Io(err.to_string())
                }
                _ => Self::Sqlite(err.to_string()),
            },
            _ => Self::Sqlite(err.to_string()),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

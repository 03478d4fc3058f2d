// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! [`ServerConfigPartial`] is what a single file or override layer provides;
//! [`ServerConfig`] is the fully resolved result.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::log_store::RetryOptions;

/// Default database file name inside the data directory.
pub const DEFAULT_DATABASE_FILE: &str = "unified_logs.db";

/// Which log store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidValue {
                field: "store".to_string(),
                message: format!("unknown store {other:?} (expected sqlite or memory)"),
            }),
        }
    }
}

/// One configuration layer, as read from a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigPartial {
    /// Server display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Log store backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreKind>,

    /// Directory holding the log database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Database file name (relative to `data_dir`) or absolute path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_file: Option<PathBuf>,

    /// SQLite busy timeout in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,

    /// Append retry policy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryOptions>,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub name: String,
    pub log_level: String,
    pub store: StoreKind,
    pub data_dir: PathBuf,
    pub database_file: PathBuf,
    pub busy_timeout_ms: u64,
    pub retry: RetryOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "calltrace".to_string(),
            log_level: "info".to_string(),
            store: StoreKind::default(),
            data_dir: default_data_dir(),
            database_file: PathBuf::from(DEFAULT_DATABASE_FILE),
            busy_timeout_ms: 250,
            retry: RetryOptions::default(),
        }
    }
}

impl ServerConfig {
    /// Full path of the log database.
    pub fn database_path(&self) -> PathBuf {
        if self.database_file.is_absolute() {
            self.database_file.clone()
        } else {
            self.data_dir.join(&self.database_file)
        }
    }

    /// Apply every field the layer sets.
    pub fn apply(&mut self, layer: &ServerConfigPartial) {
        if let Some(ref name) = layer.name {
            self.name = name.clone();
        }
        if let Some(ref level) = layer.log_level {
            self.log_level = level.clone();
        }
        if let Some(store) = layer.store {
            self.store = store;
        }
        if let Some(ref dir) = layer.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(ref file) = layer.database_file {
            self.database_file = file.clone();
        }
        if let Some(timeout) = layer.busy_timeout_ms {
            self.busy_timeout_ms = timeout;
        }
        if let Some(ref retry) = layer.retry {
            self.retry = retry.clone();
        }
    }
}

/// Platform data directory for the log database.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("calltrace")
}

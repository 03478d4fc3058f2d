// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Durable, queryable store of tool-call log records.
//!
//! # Architecture
//!
//! - [`LogStore`] trait - append and query surface shared by all backends
//! - [`SqliteLogStore`] - file-backed `unified_logs` table (the default)
//! - [`InMemoryLogStore`] - process-local store for tests and `store = "memory"`
//!
//! Writes go through a single logical writer per store. Once `append`
//! returns `Ok`, every later query on the same store observes the record.
//!
//! # Example
//!
//! ```rust,ignore
//! use calltrace::log_store::{LogStore, SqliteLogStore};
//!
//! let store = SqliteLogStore::open_at(Path::new("/tmp/unified_logs.db"))?;
//! let records = store.query_by_correlation_id("test_echo_abc123").await?;
//! ```

mod memory;
mod record;
pub mod retry;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ServerConfig, StoreKind};
use crate::error::StorageError;

pub use memory::InMemoryLogStore;
pub use record::{duration_to_ms, format_timestamp, parse_timestamp, LogRecord, LogStatus};
pub use retry::{retry_with_backoff, RetryOptions};
pub use sqlite::{SqliteLogStore, StoreOptions, LOG_TABLE, READER_CONNECTIONS, SCHEMA_VERSION};

/// Append/query surface of a log store.
///
/// Reads that find nothing return an empty result, never an error.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist one record. Records are never updated afterwards.
    async fn append(&self, record: &LogRecord) -> Result<(), StorageError>;

    /// All records with exactly this identifier, oldest first.
    async fn query_by_correlation_id(&self, id: &str) -> Result<Vec<LogRecord>, StorageError>;

    /// The most recently started record for a tool.
    async fn query_latest_by_tool(&self, tool_name: &str)
        -> Result<Option<LogRecord>, StorageError>;

    /// Records whose identifier starts with `prefix` (literal, case-sensitive),
    /// oldest first.
    async fn query_by_correlation_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<LogRecord>, StorageError>;

    /// Up to `limit` records for a tool, most recent first.
    async fn query_recent_by_tool(
        &self,
        tool_name: &str,
        limit: usize,
    ) -> Result<Vec<LogRecord>, StorageError>;
}

/// Shared handle passed into the wrapping factory at startup.
pub type SharedLogStore = Arc<dyn LogStore>;

/// Build the store selected by the configuration.
pub fn open_store(config: &ServerConfig) -> Result<SharedLogStore, StorageError> {
    match config.store {
        StoreKind::Memory => Ok(Arc::new(InMemoryLogStore::new())),
        StoreKind::Sqlite => {
            let options = StoreOptions {
                busy_timeout: std::time::Duration::from_millis(config.busy_timeout_ms),
                retry: config.retry.clone(),
            };
            let store = SqliteLogStore::open_with(&config.database_path(), options)?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_store_memory() {
        let config = ServerConfig {
            store: StoreKind::Memory,
            ..ServerConfig::default()
        };
        let store = open_store(&config).unwrap();
        assert!(store.query_by_correlation_id("x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_store_sqlite_creates_file() {
        let temp = TempDir::new().unwrap();
        let config = ServerConfig {
            store: StoreKind::Sqlite,
            data_dir: temp.path().join("nested"),
            ..ServerConfig::default()
        };
        let store = open_store(&config).unwrap();
        assert!(store.query_latest_by_tool("echo").await.unwrap().is_none());
        assert!(config.database_path().exists());
    }
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! In-process log store.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StorageError;

use super::{LogRecord, LogStore};

/// Log store kept entirely in memory.
///
/// Insertion order breaks ties between equal `started_at` values, matching
/// the SQLite store's row-id tie break.
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    records: RwLock<Vec<LogRecord>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every record, in append order.
    pub fn records(&self) -> Vec<LogRecord> {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<LogRecord>> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn select<P>(&self, predicate: P) -> Vec<LogRecord>
    where
        P: Fn(&LogRecord) -> bool,
    {
        let mut matches: Vec<LogRecord> =
            self.read().iter().filter(|r| predicate(r)).cloned().collect();
        matches.sort_by_key(|r| r.started_at);
        matches
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn append(&self, record: &LogRecord) -> Result<(), StorageError> {
        record.validate()?;
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }

    async fn query_by_correlation_id(&self, id: &str) -> Result<Vec<LogRecord>, StorageError> {
        Ok(self.select(|r| r.correlation_id.as_str() == id))
    }

    async fn query_latest_by_tool(
        &self,
        tool_name: &str,
    ) -> Result<Option<LogRecord>, StorageError> {
        Ok(self.select(|r| r.tool_name == tool_name).pop())
    }

    async fn query_by_correlation_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<LogRecord>, StorageError> {
        Ok(self.select(|r| r.correlation_id.as_str().starts_with(prefix)))
    }

    async fn query_recent_by_tool(
        &self,
        tool_name: &str,
        limit: usize,
    ) -> Result<Vec<LogRecord>, StorageError> {
        let mut matches = self.select(|r| r.tool_name == tool_name);
        matches.reverse();
        matches.truncate(limit);
        Ok(matches)
    }
}

// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! SQLite-backed log store.
//!
//! One writer connection serializes appends; a small pool of reader
//! connections serves queries. WAL mode lets readers run while an append is
//! in flight and makes every committed append visible to later reads.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
#[cfg(feature = "telemetry")]
use std::time::Instant;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StorageError;
use crate::telemetry::CorrelationId;

#[cfg(feature = "telemetry")]
use crate::telemetry::GLOBAL_METRICS;

use super::record::{format_timestamp, parse_timestamp};
use super::retry::{retry_with_backoff, RetryOptions};
use super::{LogRecord, LogStatus, LogStore};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Name of the table holding tool-call records.
pub const LOG_TABLE: &str = "unified_logs";

/// Reader connections opened per store.
pub const READER_CONNECTIONS: usize = 4;

const SELECT_COLUMNS: &str =
    "SELECT correlation_id, tool_name, timestamp, status, duration_ms, error_detail FROM unified_logs";

/// Connection tuning for [`SqliteLogStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// How long SQLite itself waits on a locked database before reporting busy.
    pub busy_timeout: Duration,
    /// Retry policy applied on top of the busy timeout.
    pub retry: RetryOptions,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(250),
            retry: RetryOptions::default(),
        }
    }
}

/// Log store persisted to a single SQLite file.
pub struct SqliteLogStore {
    writer: Arc<Mutex<Connection>>,
    readers: Arc<Vec<Mutex<Connection>>>,
    next_reader: AtomicUsize,
    path: PathBuf,
    retry: RetryOptions,
}

impl SqliteLogStore {
    /// Open or create a store at `db_path` with default options.
    pub fn open_at(db_path: &Path) -> Result<Self, StorageError> {
        Self::open_with(db_path, StoreOptions::default())
    }

    /// Open or create a store at `db_path`.
    pub fn open_with(db_path: &Path, options: StoreOptions) -> Result<Self, StorageError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let writer = Connection::open(db_path)?;
        writer.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        writer.busy_timeout(options.busy_timeout)?;
        init_schema(&writer)?;

        let readers = (0..READER_CONNECTIONS)
            .map(|_| {
                let reader = Connection::open(db_path)?;
                reader.busy_timeout(options.busy_timeout)?;
                Ok::<_, StorageError>(Mutex::new(reader))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("log_store.sqlite.open", start.elapsed());

        tracing::debug!(path = %db_path.display(), "Opened log store");

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            readers: Arc::new(readers),
            next_reader: AtomicUsize::new(0),
            path: db_path.to_path_buf(),
            retry: options.retry,
        })
    }

    /// Get the database file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read<T, F>(&self, op: &'static str, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let readers = Arc::clone(&self.readers);
        let start_at = self.next_reader.fetch_add(1, Ordering::Relaxed);
        let result = tokio::task::spawn_blocking(move || {
            let conn = checkout_reader(&readers, start_at)?;
            f(&conn)
        })
        .await
        .unwrap_or_else(|e| Err(StorageError::Internal(format!("Store task failed: {e}"))));

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation(op, start.elapsed());
        #[cfg(not(feature = "telemetry"))]
        let _ = op;

        result
    }
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS unified_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            correlation_id TEXT NOT NULL,
            tool_name TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('success', 'error')),
            duration_ms INTEGER NOT NULL CHECK (duration_ms >= 0),
            error_detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_unified_logs_correlation_id
            ON unified_logs(correlation_id);
        CREATE INDEX IF NOT EXISTS idx_unified_logs_tool_timestamp
            ON unified_logs(tool_name, timestamp);
        "#,
    )?;

    let current_version: Option<u32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    if current_version.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?)",
            params![SCHEMA_VERSION],
        )?;
    }

    Ok(())
}

/// Run `f` against the mutex-guarded writer on the blocking pool.
async fn run_blocking<T, F>(conn: Arc<Mutex<Connection>>, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let guard = conn
            .lock()
            .map_err(|_| StorageError::Internal("connection lock poisoned".to_string()))?;
        f(&guard)
    })
    .await
    .map_err(|e| StorageError::Internal(format!("Store task failed: {e}")))?
}

/// Take the first idle reader, starting at `start_at`; wait on that one if all are busy.
fn checkout_reader(
    readers: &[Mutex<Connection>],
    start_at: usize,
) -> Result<MutexGuard<'_, Connection>, StorageError> {
    if readers.is_empty() {
        return Err(StorageError::Internal("no reader connections".to_string()));
    }
    let count = readers.len();
    for offset in 0..count {
        if let Ok(conn) = readers[(start_at + offset) % count].try_lock() {
            return Ok(conn);
        }
    }
    readers[start_at % count]
        .lock()
        .map_err(|_| StorageError::Internal("connection lock poisoned".to_string()))
}

fn insert_record(conn: &Connection, record: &LogRecord) -> Result<(), StorageError> {
    let duration_ms = i64::try_from(record.duration_ms).unwrap_or(i64::MAX);

    conn.execute(
        r#"
        INSERT INTO unified_logs (
            correlation_id, tool_name, timestamp, status, duration_ms, error_detail
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            record.correlation_id.as_str(),
            record.tool_name,
            format_timestamp(&record.started_at),
            record.status.as_str(),
            duration_ms,
            record.error_detail,
        ],
    )?;

    Ok(())
}

type RawRow = (String, String, String, String, i64, Option<String>);

fn read_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_record(raw: RawRow) -> Result<LogRecord, StorageError> {
    let (correlation_id, tool_name, timestamp, status, duration_ms, error_detail) = raw;

    let correlation_id = CorrelationId::from_client(correlation_id)
        .ok_or_else(|| StorageError::Sqlite("Stored record has empty correlation_id".to_string()))?;
    let status = LogStatus::parse(&status)
        .ok_or_else(|| StorageError::Sqlite(format!("Unknown status {status:?}")))?;

    Ok(LogRecord {
        correlation_id,
        tool_name,
        started_at: parse_timestamp(&timestamp)?,
        duration_ms: u64::try_from(duration_ms).unwrap_or(0),
        status,
        error_detail,
    })
}

fn query_records(
    conn: &Connection,
    sql: &str,
    args: impl rusqlite::Params,
) -> Result<Vec<LogRecord>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(args, read_raw)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(into_record).collect()
}

/// Escape GLOB metacharacters so `prefix` matches literally.
fn glob_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        match ch {
            '*' => pattern.push_str("[*]"),
            '?' => pattern.push_str("[?]"),
            '[' => pattern.push_str("[[]"),
            _ => pattern.push(ch),
        }
    }
    pattern.push('*');
    pattern
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn append(&self, record: &LogRecord) -> Result<(), StorageError> {
        record.validate()?;

        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let result = retry_with_backoff(&self.retry, || {
            let record = record.clone();
            run_blocking(Arc::clone(&self.writer), move |conn| {
                insert_record(conn, &record)
            })
        })
        .await;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("log_store.sqlite.append", start.elapsed());

        result
    }

    async fn query_by_correlation_id(&self, id: &str) -> Result<Vec<LogRecord>, StorageError> {
        let id = id.to_string();
        self.read("log_store.sqlite.query_by_correlation_id", move |conn| {
            query_records(
                conn,
                &format!("{SELECT_COLUMNS} WHERE correlation_id = ?1 ORDER BY timestamp ASC, id ASC"),
                params![id],
            )
        })
        .await
    }

    async fn query_latest_by_tool(
        &self,
        tool_name: &str,
    ) -> Result<Option<LogRecord>, StorageError> {
        let tool_name = tool_name.to_string();
        let mut records = self
            .read("log_store.sqlite.query_latest_by_tool", move |conn| {
                query_records(
                    conn,
                    &format!(
                        "{SELECT_COLUMNS} WHERE tool_name = ?1 ORDER BY timestamp DESC, id DESC LIMIT 1"
                    ),
                    params![tool_name],
                )
            })
            .await?;

        Ok(records.pop())
    }

    async fn query_by_correlation_prefix(
        &self,
        prefix: &str,
    ) -> Result<Vec<LogRecord>, StorageError> {
        let pattern = glob_prefix(prefix);
        self.read("log_store.sqlite.query_by_correlation_prefix", move |conn| {
            query_records(
                conn,
                &format!("{SELECT_COLUMNS} WHERE correlation_id GLOB ?1 ORDER BY timestamp ASC, id ASC"),
                params![pattern],
            )
        })
        .await
    }

    async fn query_recent_by_tool(
        &self,
        tool_name: &str,
        limit: usize,
    ) -> Result<Vec<LogRecord>, StorageError> {
        let tool_name = tool_name.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.read("log_store.sqlite.query_recent_by_tool", move |conn| {
            query_records(
                conn,
                &format!("{SELECT_COLUMNS} WHERE tool_name = ?1 ORDER BY timestamp DESC, id DESC LIMIT ?2"),
                params![tool_name, limit],
            )
        })
        .await
    }
}

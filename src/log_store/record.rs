// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Log record types.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::telemetry::CorrelationId;

/// Outcome of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(Self::Success),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed (or failed) tool invocation.
///
/// `started_at` is kept at microsecond precision, the resolution of the
/// persisted `timestamp` column.
///
/// `error_detail` is present iff `status` is [`LogStatus::Error`]; build
/// records with [`LogRecord::success`] / [`LogRecord::error`] to keep that
/// invariant, and stores reject records that break it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub correlation_id: CorrelationId,
    pub tool_name: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl LogRecord {
    pub fn success(
        correlation_id: CorrelationId,
        tool_name: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            correlation_id,
            tool_name: tool_name.into(),
            started_at: started_at.trunc_subsecs(6),
            duration_ms: duration_to_ms(duration),
            status: LogStatus::Success,
            error_detail: None,
        }
    }

    /// An empty `detail` is replaced so the record stays valid.
    pub fn error(
        correlation_id: CorrelationId,
        tool_name: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: Duration,
        detail: impl Into<String>,
    ) -> Self {
        let mut detail = detail.into();
        if detail.trim().is_empty() {
            detail = "unknown error".to_string();
        }

        Self {
            correlation_id,
            tool_name: tool_name.into(),
            started_at: started_at.trunc_subsecs(6),
            duration_ms: duration_to_ms(duration),
            status: LogStatus::Error,
            error_detail: Some(detail),
        }
    }

    /// Build a record from a tool's result.
    pub fn from_outcome<T, E: std::fmt::Display>(
        correlation_id: CorrelationId,
        tool_name: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: Duration,
        outcome: &Result<T, E>,
    ) -> Self {
        match outcome {
            Ok(_) => Self::success(correlation_id, tool_name, started_at, duration),
            Err(err) => Self::error(correlation_id, tool_name, started_at, duration, err.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == LogStatus::Error
    }

    /// Check the structural invariants before persisting.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.correlation_id.as_str().trim().is_empty() {
            return Err(StorageError::InvalidRecord("empty correlation_id".to_string()));
        }
        if self.tool_name.trim().is_empty() {
            return Err(StorageError::InvalidRecord("empty tool_name".to_string()));
        }
        match (self.status, &self.error_detail) {
            (LogStatus::Error, None) => Err(StorageError::InvalidRecord(
                "error record without error_detail".to_string(),
            )),
            (LogStatus::Success, Some(_)) => Err(StorageError::InvalidRecord(
                "success record with error_detail".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Timestamp encoding used in the `timestamp` column.
///
/// Fixed-width UTC with microseconds, so lexical order is chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StorageError::Sqlite(format!("Bad timestamp {value:?}: {e}")))
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

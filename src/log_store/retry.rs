// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bounded exponential backoff for store writes.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::error::StorageError;
use crate::telemetry::GLOBAL_METRICS;

/// Retry policy for appends that hit engine contention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryOptions {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) added on top of each delay.
    pub jitter: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 10,
            max_delay_ms: 500,
            jitter: 0.1,
        }
    }
}

impl RetryOptions {
    /// Policy that never waits; used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            jitter: 0.0,
        }
    }

    /// Delay after the given (zero-based) failed attempt.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.initial_delay_ms as f64 * 2.0_f64.powi(attempt.min(30) as i32);
        let clamped = base_delay.min(self.max_delay_ms as f64);
        let jitter_amount = clamped * self.jitter.clamp(0.0, 1.0) * rand_float();

        Duration::from_millis((clamped + jitter_amount) as u64)
    }
}

/// Cheap pseudo-random float in [0, 1) from the clock; only spreads retries.
fn rand_float() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(1))
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent.
///
/// Exhausting the budget on contention yields [`StorageError::Exhausted`].
pub async fn retry_with_backoff<T, F, Fut>(
    options: &RetryOptions,
    mut operation: F,
) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => {
                attempt += 1;
                if attempt >= max_attempts {
                    return Err(StorageError::Exhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }

                let delay = options.calculate_delay(attempt - 1);
                tracing::debug!(attempt, ?delay, %error, "Store contention, retrying");
                GLOBAL_METRICS.record_retry();
                sleep(delay).await;
            }
        }
    }
}

// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Retry helper for transient RPC failures.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::warn;

/// Error-message markers that indicate a transient provider condition.
const TRANSIENT_MARKERS: &[&str] = &[
    "429",
    "503",
    "rate limit",
    "too many requests",
    "no backend",
    "currently healthy",
];

/// Retry policy: bounded attempts with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_retries: u32,
    /// Delay before the second attempt; doubles on each subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

/// Check whether an error message looks like a transient provider failure.
pub fn is_transient(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// Run an RPC operation, retrying transient failures with exponential backoff.
///
/// Non-transient errors propagate immediately. After `max_retries` attempts
/// the last error propagates regardless of kind. Worst-case total delay is
/// `base_delay * (2^(max_retries-1) - 1)`, deterministic given the policy.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_retries || !is_transient(&format!("{err:#}")) {
                    return Err(err);
                }
                let delay = policy.base_delay * 2u32.pow(attempt - 1);
                warn!(
                    "RPC attempt {}/{} failed ({}), retrying in {:?}",
                    attempt, policy.max_retries, err, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

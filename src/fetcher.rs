// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Paginated retrieval of ERC-20 Transfer logs with block timestamps.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::rpc::types::Filter;
use alloy::sol_types::SolEvent;
use anyhow::Result;
use tracing::{debug, warn};

use crate::rpc::{with_retry, RetryPolicy};
use crate::token::IERC20;

/// One decoded Transfer event.
///
/// `from`/`to` may be the zero address (mint/burn sentinel). `timestamp` is
/// absent when the block lookup failed. Records live only for the duration
/// of one aggregation pass.
#[derive(Debug, Clone)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub block_number: u64,
    pub timestamp: Option<u64>,
}

/// Split an inclusive block range into consecutive sub-windows of at most
/// `max_span` blocks, in ascending order.
pub fn split_windows(from_block: u64, to_block: u64, max_span: u64) -> Vec<(u64, u64)> {
    let mut windows = Vec::new();
    if from_block > to_block || max_span == 0 {
        return windows;
    }
    let mut start = from_block;
    while start <= to_block {
        let end = to_block.min(start + max_span - 1);
        windows.push((start, end));
        start = end + 1;
    }
    windows
}

/// Fetches Transfer logs for one token over a block range, tolerant of
/// per-query block-span limits and transient provider failures.
pub struct TransferLogFetcher<P: Provider + Clone> {
    provider: P,
    max_block_span: u64,
    retry: RetryPolicy,
}

impl<P: Provider + Clone> TransferLogFetcher<P> {
    pub fn new(provider: P, max_block_span: u64, retry: RetryPolicy) -> Self {
        Self {
            provider,
            max_block_span,
            retry,
        }
    }

    /// Fetch every Transfer emitted by `token` in `[from_block, to_block]`.
    ///
    /// Sub-windows are queried sequentially in ascending block order and the
    /// result preserves that order. A sub-window that still fails after
    /// retries is skipped with a warning: partial historical coverage beats
    /// aborting the whole metric computation. Each call re-walks its window;
    /// the block-timestamp memo is scoped to this invocation only.
    pub async fn fetch(&self, token: Address, from_block: u64, to_block: u64) -> Vec<TransferRecord> {
        let mut records = Vec::new();
        let mut timestamps: HashMap<u64, Option<u64>> = HashMap::new();

        for (start, end) in split_windows(from_block, to_block, self.max_block_span) {
            let logs = match self.fetch_window(token, start, end).await {
                Ok(logs) => logs,
                Err(e) => {
                    warn!(
                        "Skipping transfer window [{}, {}] after retries: {}",
                        start, end, e
                    );
                    continue;
                }
            };

            for log in logs {
                let Some(block_number) = log.block_number else {
                    continue;
                };
                let decoded = match log.log_decode::<IERC20::Transfer>() {
                    Ok(decoded) => decoded.inner.data,
                    Err(e) => {
                        debug!("Undecodable Transfer log at block {}: {}", block_number, e);
                        continue;
                    }
                };

                let timestamp = match timestamps.get(&block_number) {
                    Some(cached) => *cached,
                    None => {
                        let fetched = self.block_timestamp(block_number).await;
                        timestamps.insert(block_number, fetched);
                        fetched
                    }
                };

                records.push(TransferRecord {
                    from: decoded.from,
                    to: decoded.to,
                    value: decoded.value,
                    block_number,
                    timestamp,
                });
            }
        }

        debug!(
            "Fetched {} transfers for {} over [{}, {}]",
            records.len(),
            token,
            from_block,
            to_block
        );
        records
    }

    async fn fetch_window(
        &self,
        token: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<alloy::rpc::types::Log>> {
        let filter = Filter::new()
            .address(token)
            .event_signature(IERC20::Transfer::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        with_retry(&self.retry, || async {
            self.provider.get_logs(&filter).await.map_err(Into::into)
        })
        .await
    }

    async fn block_timestamp(&self, block_number: u64) -> Option<u64> {
        let result = with_retry(&self.retry, || async {
            self.provider
                .get_block_by_number(block_number.into())
                .await
                .map_err(Into::into)
        })
        .await;

        match result {
            Ok(Some(block)) => Some(block.header.timestamp),
            Ok(None) => None,
            Err(e) => {
                debug!("Timestamp lookup failed for block {}: {}", block_number, e);
                None
            }
        }
    }
}

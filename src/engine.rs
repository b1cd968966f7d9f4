// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Metrics bundle assembly.
//!
//! Runs every aggregator concurrently over its own freshly fetched block
//! window and collects the results with all-settle semantics: an individual
//! metric failure is logged and replaced by that sub-object's default, never
//! aborting the bundle. Only an unreachable RPC or unreadable token
//! metadata aborts the whole analysis.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::Provider;
use anyhow::{anyhow, Result};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetcher::{split_windows, TransferLogFetcher};
use crate::metrics::holders::SAMPLE_CAP;
use crate::metrics::{
    active, flows, hodl, holders, indicators, volume, whale, ExchangeFlows, HodlWaves,
    HolderDistribution, MvrvMetrics, NuplMetrics, NvtMetrics, WhaleActivity,
};
use crate::rpc::with_retry;
use crate::token::{self, to_decimal, TokenMeta};

/// Cap on the candidate set of the total-holder historical walk; beyond it
/// the estimator switches from exact counting to sampling extrapolation.
const HOLDER_WALK_CAP: usize = 10_000;
/// Concurrent balance queries during sampling.
const BALANCE_CONCURRENCY: usize = 8;

/// Unique-address counts over trailing windows ending at the current block.
/// Each window is counted fresh; the weekly figure is not a merge of daily
/// ones.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAddresses {
    pub daily: u64,
    pub weekly: u64,
    pub monthly: u64,
}

/// USD transfer volume per trailing window, mint/burn excluded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionVolume {
    pub volume_24h: f64,
    pub volume_7d: f64,
    pub volume_30d: f64,
}

/// The engine's sole externally visible output. Constructed fresh per
/// request, immutable after assembly, never cached. Every numeric field is
/// finite; failed sub-metrics carry their documented defaults.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBundle {
    pub active_addresses: ActiveAddresses,
    pub transaction_volume: TransactionVolume,
    pub exchange_flows: ExchangeFlows,
    pub holder_distribution: HolderDistribution,
    pub mvrv: MvrvMetrics,
    pub nupl: NuplMetrics,
    pub whale_activity: WhaleActivity,
    pub hodl_waves: HodlWaves,
    pub nvt: NvtMetrics,
    pub total_holders: u64,
}

/// Orchestrates the per-token metric aggregators.
pub struct TokenAnalyzer<P: Provider + Clone> {
    provider: P,
    config: Config,
}

impl<P: Provider + Clone> TokenAnalyzer<P> {
    pub fn new(provider: P, config: Config) -> Self {
        Self { provider, config }
    }

    /// Derive one metrics bundle for `token` at the supplied unit price.
    pub async fn analyze(&self, token: Address, price_usd: f64) -> Result<MetricsBundle> {
        let retry = self.config.retry_policy();

        let current_block = with_retry(&retry, || async {
            self.provider.get_block_number().await.map_err(Into::into)
        })
        .await?;

        let meta = token::fetch_token_meta(&self.provider, token, &retry).await?;
        let supply_units = meta.total_supply_units();
        let now = chrono::Utc::now().timestamp() as u64;

        info!(
            "Analyzing {} ({}) at block {}, supply {:.0} units",
            meta.symbol, token, current_block, supply_units
        );

        let holder_deadline = Duration::from_secs(self.config.holder_scan_deadline_secs);
        let (active, tx_volume, exchange_flows, holder_distribution, whale_activity, hodl_waves, holder_scan) =
            futures_util::join!(
                settle("activeAddresses", self.active_addresses(token, current_block)),
                settle(
                    "transactionVolume",
                    self.transaction_volume(token, current_block, &meta, price_usd)
                ),
                settle(
                    "exchangeFlows",
                    self.exchange_flows(token, current_block, &meta, price_usd)
                ),
                settle(
                    "holderDistribution",
                    self.holder_distribution(token, current_block, &meta)
                ),
                settle(
                    "whaleActivity",
                    self.whale_activity(token, current_block, &meta, price_usd)
                ),
                settle(
                    "hodlWaves",
                    self.hodl_waves(token, current_block, &meta, now)
                ),
                async {
                    tokio::time::timeout(
                        holder_deadline,
                        self.estimate_total_holders(token, current_block),
                    )
                    .await
                    .map_err(|_| anyhow!("deadline of {:?} exceeded", holder_deadline))?
                },
            );

        // The historical walk is optional enrichment: when it misses its
        // budget or fails, the monthly unique-address count stands in.
        let total_holders = match holder_scan {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    "Total-holder scan unavailable ({}), using monthly active count",
                    e
                );
                active.monthly
            }
        };

        let mvrv = indicators::mvrv(price_usd, supply_units);
        let nupl = indicators::nupl(&mvrv);
        let nvt = indicators::nvt(mvrv.market_value, tx_volume.volume_30d);

        Ok(MetricsBundle {
            active_addresses: active,
            transaction_volume: tx_volume,
            exchange_flows,
            holder_distribution,
            mvrv,
            nupl,
            whale_activity,
            hodl_waves,
            nvt,
            total_holders,
        })
    }

    fn fetcher(&self) -> TransferLogFetcher<P> {
        TransferLogFetcher::new(
            self.provider.clone(),
            self.config.max_block_span,
            self.config.retry_policy(),
        )
    }

    /// Trailing window of `seconds` ending at `current_block`, inclusive.
    fn window(&self, current_block: u64, seconds: u64) -> (u64, u64) {
        let from = current_block.saturating_sub(self.config.blocks_for(seconds));
        (from, current_block)
    }

    async fn active_addresses(&self, token: Address, current_block: u64) -> Result<ActiveAddresses> {
        // Three fresh unique-address counts over three windows; an address
        // active in several sub-windows still counts once per window.
        let (daily, weekly, monthly) = futures_util::join!(
            self.count_window(token, current_block, self.config.day_seconds),
            self.count_window(token, current_block, self.config.week_seconds),
            self.count_window(token, current_block, self.config.month_seconds),
        );
        Ok(ActiveAddresses {
            daily,
            weekly,
            monthly,
        })
    }

    async fn count_window(&self, token: Address, current_block: u64, seconds: u64) -> u64 {
        let (from, to) = self.window(current_block, seconds);
        let records = self.fetcher().fetch(token, from, to).await;
        active::count_active(&records)
    }

    async fn transaction_volume(
        &self,
        token: Address,
        current_block: u64,
        meta: &TokenMeta,
        price_usd: f64,
    ) -> Result<TransactionVolume> {
        let (v24h, v7d, v30d) = futures_util::join!(
            self.volume_window(token, current_block, self.config.day_seconds, meta, price_usd),
            self.volume_window(token, current_block, self.config.week_seconds, meta, price_usd),
            self.volume_window(token, current_block, self.config.month_seconds, meta, price_usd),
        );
        Ok(TransactionVolume {
            volume_24h: v24h,
            volume_7d: v7d,
            volume_30d: v30d,
        })
    }

    async fn volume_window(
        &self,
        token: Address,
        current_block: u64,
        seconds: u64,
        meta: &TokenMeta,
        price_usd: f64,
    ) -> f64 {
        let (from, to) = self.window(current_block, seconds);
        let records = self.fetcher().fetch(token, from, to).await;
        volume::sum_volume_usd(&records, meta.decimals, price_usd)
    }

    async fn exchange_flows(
        &self,
        token: Address,
        current_block: u64,
        meta: &TokenMeta,
        price_usd: f64,
    ) -> Result<ExchangeFlows> {
        let (from, to) = self.window(current_block, self.config.day_seconds);
        let records = self.fetcher().fetch(token, from, to).await;
        Ok(flows::analyze(
            &records,
            &self.config.exchange_addresses,
            meta.decimals,
            price_usd,
        ))
    }

    async fn whale_activity(
        &self,
        token: Address,
        current_block: u64,
        meta: &TokenMeta,
        price_usd: f64,
    ) -> Result<WhaleActivity> {
        let (from, to) = self.window(current_block, self.config.day_seconds);
        let records = self.fetcher().fetch(token, from, to).await;
        Ok(whale::analyze(
            &records,
            self.config.large_tx_threshold_usd,
            &self.config.exchange_addresses,
            meta.decimals,
            price_usd,
        ))
    }

    async fn hodl_waves(
        &self,
        token: Address,
        current_block: u64,
        meta: &TokenMeta,
        now: u64,
    ) -> Result<HodlWaves> {
        let (from, to) = self.window(current_block, 365 * self.config.day_seconds);
        let records = self.fetcher().fetch(token, from, to).await;
        Ok(hodl::bucketize(&records, now, meta.total_supply, meta.decimals))
    }

    async fn holder_distribution(
        &self,
        token: Address,
        current_block: u64,
        meta: &TokenMeta,
    ) -> Result<HolderDistribution> {
        let (from, to) = self.window(current_block, self.config.month_seconds);
        let records = self.fetcher().fetch(token, from, to).await;

        let candidates = holders::candidate_holders(&records);
        let balances = self
            .sample_balances(token, candidates.iter().take(SAMPLE_CAP).copied(), meta.decimals)
            .await;

        Ok(holders::distribution_from_balances(
            &balances,
            meta.total_supply_units(),
        ))
    }

    /// Query current balances for a set of holders. A failed query skips
    /// that one address (zero balance) instead of aborting the sample.
    async fn sample_balances(
        &self,
        token: Address,
        addresses: impl Iterator<Item = Address>,
        decimals: u8,
    ) -> Vec<f64> {
        let retry = self.config.retry_policy();
        stream::iter(addresses)
            .map(|holder| {
                let retry = retry.clone();
                async move {
                    let result = with_retry(&retry, || async {
                        token::balance_of(&self.provider, token, holder).await
                    })
                    .await;
                    match result {
                        Ok(balance) => to_decimal(balance, decimals),
                        Err(e) => {
                            debug!("Balance query failed for {}: {}", holder, e);
                            0.0
                        }
                    }
                }
            })
            .buffer_unordered(BALANCE_CONCURRENCY)
            .collect()
            .await
    }

    /// Bounded 90-day backward walk counting unique transacting addresses,
    /// with balance-sampling extrapolation past [`HOLDER_WALK_CAP`].
    ///
    /// Unlike the transfer fetcher this does not tolerate missing windows: a
    /// failed window aborts the walk so the caller can fall back to the
    /// cheaper single-window estimate.
    async fn estimate_total_holders(&self, token: Address, current_block: u64) -> Result<u64> {
        let retry = self.config.retry_policy();
        let lookback = self.config.blocks_for(90 * self.config.day_seconds);
        let from_block = current_block.saturating_sub(lookback);

        let mut seen: HashSet<Address> = HashSet::new();
        let mut candidates: Vec<Address> = Vec::new();

        let mut windows = split_windows(from_block, current_block, self.config.max_block_span);
        windows.reverse();

        for (start, end) in windows {
            let filter = alloy::rpc::types::Filter::new()
                .address(token)
                .event_signature(
                    <token::IERC20::Transfer as alloy::sol_types::SolEvent>::SIGNATURE_HASH,
                )
                .from_block(start)
                .to_block(end);

            let logs = with_retry(&retry, || async {
                self.provider.get_logs(&filter).await.map_err(Into::into)
            })
            .await?;

            for log in logs {
                let Ok(decoded) = log.log_decode::<token::IERC20::Transfer>() else {
                    continue;
                };
                let event = decoded.inner.data;
                for address in [event.from, event.to] {
                    if address != Address::ZERO && seen.insert(address) {
                        candidates.push(address);
                    }
                }
            }
        }

        if candidates.is_empty() {
            return Ok(0);
        }

        if candidates.len() <= HOLDER_WALK_CAP {
            let nonzero = self.count_nonzero_balances(token, &candidates).await;
            debug!(
                "Holder walk: {} candidates, {} with balance (exact)",
                candidates.len(),
                nonzero
            );
            return Ok(nonzero);
        }

        let sample = &candidates[..HOLDER_WALK_CAP];
        let nonzero = self.count_nonzero_balances(token, sample).await;
        let estimated = (candidates.len() as f64 * nonzero as f64 / sample.len() as f64).ceil();
        debug!(
            "Holder walk: {} candidates, {}/{} sampled with balance, estimate {}",
            candidates.len(),
            nonzero,
            sample.len(),
            estimated
        );
        Ok(estimated as u64)
    }

    async fn count_nonzero_balances(&self, token: Address, addresses: &[Address]) -> u64 {
        let retry = self.config.retry_policy();
        stream::iter(addresses.iter().copied())
            .map(|holder| {
                let retry = retry.clone();
                async move {
                    with_retry(&retry, || async {
                        token::balance_of(&self.provider, token, holder).await
                    })
                    .await
                    .map(|balance| !balance.is_zero())
                    .unwrap_or(false)
                }
            })
            .buffer_unordered(BALANCE_CONCURRENCY)
            .filter(|has_balance| std::future::ready(*has_balance))
            .count()
            .await as u64
    }
}

/// Resolve one metric with all-settle semantics: a failure is logged with
/// the metric's name and becomes that metric's documented default.
async fn settle<T: Default>(name: &str, fut: impl Future<Output = Result<T>>) -> T {
    match fut.await {
        Ok(value) => value,
        Err(e) => {
            warn!("Metric {} failed, substituting default: {}", name, e);
            T::default()
        }
    }
}

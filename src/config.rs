// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration module - loads settings from environment variables.

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{anyhow, Result};

use crate::rpc::RetryPolicy;

/// Router addresses treated as exchanges when nothing is configured.
const DEFAULT_EXCHANGE_ADDRESSES: &[&str] = &[
    "0x60aE616a2155Ee3d9A68541Ba4544862310933d4", // TraderJoe router
    "0xE54Ca86531e17Ef3616d22cA28b0D458b6C89106", // Pangolin router
];

/// Main configuration for the metrics engine.
#[derive(Debug, Clone)]
pub struct Config {
    // RPC
    pub rpc_url: String,
    pub rpc_fallback_urls: Vec<String>,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,

    // Windowing
    /// Assumed seconds per block, a documented approximation used to size
    /// block windows; never measured from the chain.
    pub avg_block_time_secs: f64,
    /// Per-eth_getLogs block-span limit.
    pub max_block_span: u64,
    pub day_seconds: u64,
    pub week_seconds: u64,
    pub month_seconds: u64,

    // Metrics
    pub exchange_addresses: HashSet<Address>,
    pub large_tx_threshold_usd: f64,
    /// Budget for the slow total-holder historical walk.
    pub holder_scan_deadline_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let exchange_addresses = match std::env::var("EXCHANGE_ADDRESSES") {
            Ok(raw) => parse_address_list(&raw)?,
            Err(_) => parse_address_list(&DEFAULT_EXCHANGE_ADDRESSES.join(","))?,
        };

        Ok(Self {
            rpc_url: env_var("RPC_URL")?,
            rpc_fallback_urls: env_var_or("RPC_FALLBACK_URLS", "")
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            max_retries: env_var_or("RPC_MAX_RETRIES", "3").parse().unwrap_or(3),
            retry_base_delay_ms: env_var_or("RPC_RETRY_BASE_DELAY_MS", "1000")
                .parse()
                .unwrap_or(1000),

            avg_block_time_secs: env_var_or("AVG_BLOCK_TIME_SECS", "2.0")
                .parse()
                .unwrap_or(2.0),
            max_block_span: env_var_or("MAX_BLOCK_SPAN", "2048").parse().unwrap_or(2048),
            day_seconds: env_var_or("DAY_SECONDS", "86400").parse().unwrap_or(86_400),
            week_seconds: env_var_or("WEEK_SECONDS", "604800")
                .parse()
                .unwrap_or(604_800),
            month_seconds: env_var_or("MONTH_SECONDS", "2592000")
                .parse()
                .unwrap_or(2_592_000),

            exchange_addresses,
            large_tx_threshold_usd: env_var_or("LARGE_TX_THRESHOLD_USD", "100000")
                .parse()
                .unwrap_or(100_000.0),
            holder_scan_deadline_secs: env_var_or("HOLDER_SCAN_DEADLINE_SECS", "120")
                .parse()
                .unwrap_or(120),
        })
    }

    /// Ordered endpoint list: primary first, then fallbacks.
    pub fn endpoints(&self) -> Vec<String> {
        let mut endpoints = vec![self.rpc_url.clone()];
        endpoints.extend(self.rpc_fallback_urls.iter().cloned());
        endpoints
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// Number of blocks covering `seconds` at the assumed block time.
    pub fn blocks_for(&self, seconds: u64) -> u64 {
        ((seconds as f64 / self.avg_block_time_secs).round() as u64).max(1)
    }
}

impl Default for Config {
    /// Local-node defaults, used by tests and as documentation of the knobs.
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            rpc_fallback_urls: Vec::new(),
            max_retries: 3,
            retry_base_delay_ms: 1000,
            avg_block_time_secs: 2.0,
            max_block_span: 2048,
            day_seconds: 86_400,
            week_seconds: 604_800,
            month_seconds: 2_592_000,
            exchange_addresses: parse_address_list(&DEFAULT_EXCHANGE_ADDRESSES.join(","))
                .unwrap_or_default(),
            large_tx_threshold_usd: 100_000.0,
            holder_scan_deadline_secs: 120,
        }
    }
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| anyhow!("{} not set", name))
}

fn env_var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_address_list(raw: &str) -> Result<HashSet<Address>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Address::from_str(s).map_err(|e| anyhow!("Invalid address {}: {}", s, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_for_assumed_block_time() {
        let config = Config::default();
        assert_eq!(config.blocks_for(86_400), 43_200);
        assert_eq!(config.blocks_for(0), 1);

        let slow = Config {
            avg_block_time_secs: 12.0,
            ..Config::default()
        };
        assert_eq!(slow.blocks_for(86_400), 7_200);
    }

    #[test]
    fn test_default_exchange_set() {
        let config = Config::default();
        assert_eq!(config.exchange_addresses.len(), 2);
        let joe: Address = "0x60aE616a2155Ee3d9A68541Ba4544862310933d4"
            .parse()
            .unwrap();
        assert!(config.exchange_addresses.contains(&joe));
    }

    #[test]
    fn test_parse_address_list() {
        let set = parse_address_list(
            " 0x60aE616a2155Ee3d9A68541Ba4544862310933d4 ,0xE54Ca86531e17Ef3616d22cA28b0D458b6C89106,",
        )
        .unwrap();
        assert_eq!(set.len(), 2);

        assert!(parse_address_list("not-an-address").is_err());
        assert!(parse_address_list("").unwrap().is_empty());
    }

    #[test]
    fn test_endpoints_order() {
        let config = Config {
            rpc_url: "https://primary".to_string(),
            rpc_fallback_urls: vec!["https://fb1".to_string(), "https://fb2".to_string()],
            ..Config::default()
        };
        assert_eq!(config.endpoints(), vec!["https://primary", "https://fb1", "https://fb2"]);
    }
}

// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! ERC-20 bindings, token metadata reads and unit conversion.

use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use alloy::sol;
use anyhow::{Context, Result};
use tracing::warn;

use crate::rpc::{with_retry, RetryPolicy};

// ERC20 interface for metadata, balance queries and transfer logs
sol! {
    #[sol(rpc)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);

        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function name() external view returns (string);
    }
}

/// On-chain token metadata.
#[derive(Debug, Clone)]
pub struct TokenMeta {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

impl TokenMeta {
    /// Total supply in decimal token units.
    pub fn total_supply_units(&self) -> f64 {
        to_decimal(self.total_supply, self.decimals)
    }
}

/// Read token metadata from the contract.
///
/// `decimals` and `totalSupply` gate every downstream metric, so their
/// failure (after retries) aborts the analysis. `name` and `symbol` are
/// cosmetic and fall back to placeholders.
pub async fn fetch_token_meta<P: Provider + Clone>(
    provider: &P,
    token: Address,
    retry: &RetryPolicy,
) -> Result<TokenMeta> {
    let contract = IERC20::new(token, provider);

    let decimals = with_retry(retry, || async {
        contract.decimals().call().await.map_err(Into::into)
    })
    .await
    .context("failed to read token decimals")?;

    let total_supply = with_retry(retry, || async {
        contract.totalSupply().call().await.map_err(Into::into)
    })
    .await
    .context("failed to read token totalSupply")?;

    let name = match contract.name().call().await {
        Ok(name) => name,
        Err(e) => {
            warn!("Failed to read token name: {}", e);
            "Unknown Token".to_string()
        }
    };

    let symbol = match contract.symbol().call().await {
        Ok(symbol) => symbol,
        Err(e) => {
            warn!("Failed to read token symbol: {}", e);
            "UNKNOWN".to_string()
        }
    };

    Ok(TokenMeta {
        address: token,
        name,
        symbol,
        decimals,
        total_supply,
    })
}

/// Query the current balance of one holder.
pub async fn balance_of<P: Provider + Clone>(
    provider: &P,
    token: Address,
    holder: Address,
) -> Result<U256> {
    let contract = IERC20::new(token, provider);
    contract.balanceOf(holder).call().await.map_err(Into::into)
}

/// Convert a raw token amount to decimal units.
///
/// Amounts beyond u128 saturate; they are outside f64's useful range anyway.
pub fn to_decimal(value: U256, decimals: u8) -> f64 {
    let raw = value.min(U256::from(u128::MAX)).to::<u128>();
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Validate the 0x-prefixed 40-hex-digit address format at the boundary.
pub fn is_valid_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

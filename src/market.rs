// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Market-data collaborator: current USD price from DexScreener.
//!
//! The engine itself never fetches prices; it takes the unit price as an
//! input. This module exists so the CLI has a price source. Responses are
//! parsed into explicit schemas with defaulted optional fields instead of
//! ad-hoc field probing.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

const DEX_SCREENER_BASE_URL: &str = "https://api.dexscreener.com";

#[derive(Debug, Default, Deserialize)]
struct TokenPairsResponse {
    #[serde(default)]
    pairs: Option<Vec<PairData>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PairData {
    price_usd: Option<String>,
    fdv: Option<f64>,
    market_cap: Option<f64>,
    liquidity: Liquidity,
    volume: VolumeWindows,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Liquidity {
    usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct VolumeWindows {
    h24: Option<f64>,
}

impl PairData {
    fn liquidity_usd(&self) -> f64 {
        self.liquidity.usd.unwrap_or(0.0)
    }
}

/// Aggregated market snapshot for one token.
#[derive(Debug, Clone)]
pub struct PriceQuote {
    /// Unit price from the deepest pair.
    pub price_usd: f64,
    /// FDV of the deepest pair, falling back to its reported market cap.
    pub market_cap: Option<f64>,
    /// 24h volume summed across all pairs.
    pub volume_24h: f64,
    /// Liquidity summed across all pairs.
    pub liquidity_usd: f64,
}

/// Fetch the current price for a token address.
pub async fn fetch_price(client: &reqwest::Client, token_address: &str) -> Result<PriceQuote> {
    let url = format!("{DEX_SCREENER_BASE_URL}/latest/dex/tokens/{token_address}");
    let response = client
        .get(&url)
        .header("user-agent", "token-sentinel/0.1")
        .send()
        .await
        .context("DexScreener request failed")?
        .error_for_status()
        .context("DexScreener returned an error status")?;

    let parsed: TokenPairsResponse = response
        .json()
        .await
        .context("DexScreener response was not valid JSON")?;

    let pairs = parsed.pairs.unwrap_or_default();
    debug!("DexScreener returned {} pairs for {}", pairs.len(), token_address);
    aggregate_pairs(&pairs)
}

/// Reduce the pair list to one quote: price from the deepest pool,
/// volume and liquidity aggregated across all pools.
fn aggregate_pairs(pairs: &[PairData]) -> Result<PriceQuote> {
    let best = pairs
        .iter()
        .max_by(|a, b| {
            a.liquidity_usd()
                .partial_cmp(&b.liquidity_usd())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .ok_or_else(|| anyhow!("no liquidity pairs found for token"))?;

    let price_usd = best
        .price_usd
        .as_deref()
        .and_then(|p| p.parse::<f64>().ok())
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| anyhow!("deepest pair carries no usable price"))?;

    let volume_24h = pairs.iter().filter_map(|p| p.volume.h24).sum();
    let liquidity_usd = pairs.iter().map(PairData::liquidity_usd).sum();

    Ok(PriceQuote {
        price_usd,
        market_cap: best.fdv.or(best.market_cap),
        volume_24h,
        liquidity_usd,
    })
}

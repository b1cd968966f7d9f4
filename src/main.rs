// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Token Sentinel CLI - derive an on-chain metrics bundle for one token.

use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use clap::Parser;
use serde_json::json;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use token_sentinel::config::Config;
use token_sentinel::engine::TokenAnalyzer;
use token_sentinel::market;
use token_sentinel::rpc::connect_provider;
use token_sentinel::token::is_valid_address;

#[derive(Debug, Parser)]
#[command(name = "token-sentinel", about = "On-chain risk metrics for ERC-20 tokens")]
struct Args {
    /// Token contract address (0x-prefixed, 40 hex characters)
    token: String,

    /// Current unit price in USD; skips the DexScreener lookup
    #[arg(long)]
    price: Option<f64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if !is_valid_address(&args.token) {
        return Err(anyhow!(
            "Invalid token address format: {} (expected 0x + 40 hex characters)",
            args.token
        ));
    }
    let token: Address = args.token.parse()?;

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load config: {}", e);
        e
    })?;

    info!("Connecting to RPC...");
    let provider = connect_provider(&config.endpoints()).await?;

    let price_usd = match args.price {
        Some(price) => price,
        None => {
            let client = reqwest::Client::new();
            let quote = market::fetch_price(&client, &args.token).await?;
            info!(
                "DexScreener price ${:.6} (liquidity ${:.0}, 24h volume ${:.0})",
                quote.price_usd, quote.liquidity_usd, quote.volume_24h
            );
            quote.price_usd
        }
    };

    let analyzer = TokenAnalyzer::new(provider, config);
    let bundle = analyzer.analyze(token, price_usd).await?;

    let report = json!({
        "tokenAddress": args.token,
        "priceUsd": price_usd,
        "metrics": bundle,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Provider setup for the analysis RPC connection.

use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::http::reqwest::Url;
use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

/// Connect to the first healthy endpoint in an ordered list.
///
/// Endpoint selection is a configuration concern: the caller hands over the
/// already-resolved list (primary first, then fallbacks) and this walks it
/// once at connection time, probing each endpoint with `eth_blockNumber`.
/// Transient failures of the chosen connection are handled later by the
/// retry helper, not here.
pub async fn connect_provider(endpoints: &[String]) -> Result<DynProvider> {
    if endpoints.is_empty() {
        return Err(anyhow!("no RPC endpoints configured"));
    }

    for endpoint in endpoints {
        let url: Url = match endpoint.parse() {
            Ok(url) => url,
            Err(e) => {
                warn!("Skipping invalid RPC URL {}: {}", endpoint, e);
                continue;
            }
        };

        let provider = ProviderBuilder::new().connect_http(url);
        match provider.get_block_number().await {
            Ok(block) => {
                info!("Connected to {} (block {})", endpoint, block);
                return Ok(provider.erased());
            }
            Err(e) => {
                warn!("RPC endpoint {} unreachable: {}", endpoint, e);
            }
        }
    }

    Err(anyhow!("all {} RPC endpoints unreachable", endpoints.len()))
        .context("cannot analyze without a working RPC connection")
}

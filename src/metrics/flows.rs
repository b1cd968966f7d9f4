// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exchange inflow/outflow netting over a 24h transfer window.

use std::collections::HashSet;

use alloy::primitives::Address;
use serde::Serialize;

use crate::fetcher::TransferRecord;
use crate::token::to_decimal;

/// Netted exchange flows for one window, token units and USD.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeFlows {
    /// Tokens sent to known exchange addresses (selling pressure).
    pub inflows_24h: f64,
    /// Tokens sent from known exchange addresses (accumulation).
    pub outflows_24h: f64,
    /// `outflows - inflows`; positive means net accumulation.
    pub net_flow: f64,
    #[serde(rename = "netFlowUSD")]
    pub net_flow_usd: f64,
}

/// Net transfers against a known exchange/router address set.
///
/// With an empty set, or a window that never touches it, every field is
/// zero: a valid result, not an error (most tokens show zero against the
/// small default set; known limitation).
pub fn analyze(
    records: &[TransferRecord],
    exchanges: &HashSet<Address>,
    decimals: u8,
    price_usd: f64,
) -> ExchangeFlows {
    let mut inflows = 0.0;
    let mut outflows = 0.0;

    for record in records {
        let units = to_decimal(record.value, decimals);
        if exchanges.contains(&record.to) {
            inflows += units;
        }
        if exchanges.contains(&record.from) {
            outflows += units;
        }
    }

    let net_flow = outflows - inflows;
    ExchangeFlows {
        inflows_24h: inflows,
        outflows_24h: outflows,
        net_flow,
        net_flow_usd: net_flow * price_usd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_util::{addr, transfer_units};

    #[test]
    fn test_netting_is_accumulation_positive() {
        let exchange = addr(0xEE);
        let exchanges: HashSet<Address> = [exchange].into_iter().collect();

        let records = vec![
            // Exchange pays out 100 (accumulation) ...
            transfer_units(exchange, addr(1), 100.0, 10),
            // ... and receives 50 (selling).
            transfer_units(addr(2), exchange, 50.0, 11),
        ];

        let flows = analyze(&records, &exchanges, 18, 2.0);
        assert!((flows.outflows_24h - 100.0).abs() < 1e-9);
        assert!((flows.inflows_24h - 50.0).abs() < 1e-9);
        assert!((flows.net_flow - 50.0).abs() < 1e-9);
        assert!((flows.net_flow_usd - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_exchange_set_is_all_zero() {
        let records = vec![transfer_units(addr(1), addr(2), 1000.0, 10)];
        let flows = analyze(&records, &HashSet::new(), 18, 2.0);
        assert_eq!(flows.inflows_24h, 0.0);
        assert_eq!(flows.outflows_24h, 0.0);
        assert_eq!(flows.net_flow, 0.0);
        assert_eq!(flows.net_flow_usd, 0.0);
    }

    #[test]
    fn test_untouched_exchange_set_is_all_zero() {
        let exchanges: HashSet<Address> = [addr(0xEE)].into_iter().collect();
        let records = vec![transfer_units(addr(1), addr(2), 1000.0, 10)];
        let flows = analyze(&records, &exchanges, 18, 2.0);
        assert_eq!(flows.net_flow, 0.0);
    }
}

// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Transaction-volume summation over a transfer window.

use alloy::primitives::Address;

use crate::fetcher::TransferRecord;
use crate::token::to_decimal;

/// Sum transferred value in USD across all non-mint, non-burn transfers.
///
/// Values are scaled to decimal units and priced at the current unit price,
/// not the historical per-block price (documented approximation). The 24h,
/// 7d and 30d figures each come from an independent fetch over their own
/// block range, not from cumulative derivation.
pub fn sum_volume_usd(records: &[TransferRecord], decimals: u8, price_usd: f64) -> f64 {
    records
        .iter()
        .filter(|r| r.from != Address::ZERO && r.to != Address::ZERO)
        .map(|r| to_decimal(r.value, decimals) * price_usd)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_util::{addr, transfer_units};

    #[test]
    fn test_sums_and_prices_transfers() {
        let records = vec![
            transfer_units(addr(1), addr(2), 100.0, 10),
            transfer_units(addr(2), addr(3), 50.0, 11),
        ];
        let volume = sum_volume_usd(&records, 18, 2.0);
        assert!((volume - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_mint_and_burn_excluded() {
        let records = vec![
            transfer_units(Address::ZERO, addr(1), 1000.0, 10), // mint
            transfer_units(addr(1), Address::ZERO, 500.0, 11),  // burn
            transfer_units(addr(1), addr(2), 10.0, 12),
        ];
        let volume = sum_volume_usd(&records, 18, 1.0);
        assert!((volume - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_window_is_zero() {
        assert_eq!(sum_volume_usd(&[], 18, 2.0), 0.0);
    }
}

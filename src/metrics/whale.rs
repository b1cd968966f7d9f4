// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Large-transfer detection and accumulation/distribution scoring.

use std::collections::HashSet;

use alloy::primitives::Address;
use serde::Serialize;

use crate::fetcher::TransferRecord;
use crate::token::to_decimal;

/// Whale activity over a 24h window.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleActivity {
    pub large_transactions_24h: u64,
    /// USD volume of transfers at or above the large-transaction threshold.
    pub whale_volume_24h: f64,
    /// `(accumulation - distribution) / (accumulation + distribution)`,
    /// clamped to [-1, 1]; 0 when both volumes are zero.
    pub accumulation_score: f64,
}

/// Scan a window for transfers at or above `threshold_usd`.
///
/// A large transfer counts as accumulation when the destination is neither a
/// known exchange nor the zero address, and as distribution when the source
/// is neither. A wallet-to-wallet transfer therefore lands in both buckets;
/// that double-count is inherited behavior and is kept on purpose.
pub fn analyze(
    records: &[TransferRecord],
    threshold_usd: f64,
    exchanges: &HashSet<Address>,
    decimals: u8,
    price_usd: f64,
) -> WhaleActivity {
    let mut large_count = 0u64;
    let mut whale_volume = 0.0;
    let mut accumulation = 0.0;
    let mut distribution = 0.0;

    for record in records {
        let usd = to_decimal(record.value, decimals) * price_usd;
        if usd < threshold_usd {
            continue;
        }
        large_count += 1;
        whale_volume += usd;

        if record.to != Address::ZERO && !exchanges.contains(&record.to) {
            accumulation += usd;
        }
        if record.from != Address::ZERO && !exchanges.contains(&record.from) {
            distribution += usd;
        }
    }

    let total = accumulation + distribution;
    let score = if total > 0.0 {
        ((accumulation - distribution) / total).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    WhaleActivity {
        large_transactions_24h: large_count,
        whale_volume_24h: whale_volume,
        accumulation_score: score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_util::{addr, transfer_units};

    const THRESHOLD: f64 = 100_000.0;

    #[test]
    fn test_wallet_to_wallet_counts_in_both_buckets() {
        // One $150k transfer between two plain wallets: it is counted once,
        // yet feeds accumulation and distribution alike, netting to score 0.
        let records = vec![transfer_units(addr(1), addr(2), 150_000.0, 10)];
        let activity = analyze(&records, THRESHOLD, &HashSet::new(), 18, 1.0);

        assert_eq!(activity.large_transactions_24h, 1);
        assert!((activity.whale_volume_24h - 150_000.0).abs() < 1e-6);
        assert_eq!(activity.accumulation_score, 0.0);
    }

    #[test]
    fn test_below_threshold_ignored() {
        let records = vec![transfer_units(addr(1), addr(2), 99_999.0, 10)];
        let activity = analyze(&records, THRESHOLD, &HashSet::new(), 18, 1.0);
        assert_eq!(activity.large_transactions_24h, 0);
        assert_eq!(activity.whale_volume_24h, 0.0);
        assert_eq!(activity.accumulation_score, 0.0);
    }

    #[test]
    fn test_exchange_withdrawal_scores_accumulation() {
        let exchange = addr(0xEE);
        let exchanges: HashSet<Address> = [exchange].into_iter().collect();

        // $200k out of the exchange into a wallet: pure accumulation.
        let records = vec![transfer_units(exchange, addr(1), 200_000.0, 10)];
        let activity = analyze(&records, THRESHOLD, &exchanges, 18, 1.0);

        assert_eq!(activity.large_transactions_24h, 1);
        assert_eq!(activity.accumulation_score, 1.0);
    }

    #[test]
    fn test_exchange_deposit_scores_distribution() {
        let exchange = addr(0xEE);
        let exchanges: HashSet<Address> = [exchange].into_iter().collect();

        let records = vec![transfer_units(addr(1), exchange, 200_000.0, 10)];
        let activity = analyze(&records, THRESHOLD, &exchanges, 18, 1.0);

        assert_eq!(activity.accumulation_score, -1.0);
    }

    #[test]
    fn test_score_zero_when_quiet() {
        let activity = analyze(&[], THRESHOLD, &HashSet::new(), 18, 1.0);
        assert_eq!(activity.accumulation_score, 0.0);
        assert_eq!(activity.large_transactions_24h, 0);
    }

    #[test]
    fn test_score_stays_in_range() {
        let exchange = addr(0xEE);
        let exchanges: HashSet<Address> = [exchange].into_iter().collect();
        let records = vec![
            transfer_units(exchange, addr(1), 500_000.0, 10),
            transfer_units(addr(2), addr(3), 150_000.0, 11),
            transfer_units(addr(4), exchange, 120_000.0, 12),
        ];
        let activity = analyze(&records, THRESHOLD, &exchanges, 18, 1.0);
        assert!(activity.accumulation_score >= -1.0 && activity.accumulation_score <= 1.0);
    }
}

// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Age-bucketed HODL waves over a long transfer lookback.

use alloy::primitives::U256;
use serde::Serialize;

use crate::fetcher::TransferRecord;
use crate::token::to_decimal;

const DAY: u64 = 86_400;
const WEEK: u64 = 7 * DAY;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// Share of circulating supply moved per age band, in percent.
///
/// Buckets value by the age of the transfer event itself, not by true
/// unspent-output age per token: "how recently was this value moved" rather
/// than UTXO-style holding age. That simplification is inherited and kept.
/// Bucket sums stay at or below 100% of the supply observed in the window.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HodlWaves {
    pub less_than_1d: f64,
    pub d1_to_7: f64,
    pub w1_to_4: f64,
    pub m1_to_3: f64,
    pub m3_to_6: f64,
    pub m6_to_12: f64,
    pub more_than_1y: f64,
}

/// Bucket each timestamped transfer's value by `now - timestamp` and
/// normalize by total supply. Transfers without a resolved timestamp are
/// skipped.
pub fn bucketize(
    records: &[TransferRecord],
    now: u64,
    total_supply: U256,
    decimals: u8,
) -> HodlWaves {
    let supply_units = to_decimal(total_supply, decimals);
    if supply_units <= 0.0 {
        return HodlWaves::default();
    }

    let mut waves = HodlWaves::default();
    for record in records {
        let Some(timestamp) = record.timestamp else {
            continue;
        };
        let age = now.saturating_sub(timestamp);
        let units = to_decimal(record.value, decimals);

        if age < DAY {
            waves.less_than_1d += units;
        } else if age < WEEK {
            waves.d1_to_7 += units;
        } else if age < 4 * WEEK {
            waves.w1_to_4 += units;
        } else if age < 3 * MONTH {
            waves.m1_to_3 += units;
        } else if age < 6 * MONTH {
            waves.m3_to_6 += units;
        } else if age < YEAR {
            waves.m6_to_12 += units;
        } else {
            waves.more_than_1y += units;
        }
    }

    let pct = 100.0 / supply_units;
    HodlWaves {
        less_than_1d: waves.less_than_1d * pct,
        d1_to_7: waves.d1_to_7 * pct,
        w1_to_4: waves.w1_to_4 * pct,
        m1_to_3: waves.m1_to_3 * pct,
        m3_to_6: waves.m3_to_6 * pct,
        m6_to_12: waves.m6_to_12 * pct,
        more_than_1y: waves.more_than_1y * pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_util::{addr, transfer_units_at, units};

    const NOW: u64 = 1_700_000_000;

    fn supply(n: f64) -> U256 {
        units(n)
    }

    #[test]
    fn test_bucket_boundaries() {
        let records = vec![
            transfer_units_at(addr(1), addr(2), 10.0, Some(NOW - 3_600)), // <1d
            transfer_units_at(addr(1), addr(2), 10.0, Some(NOW - 2 * DAY)), // 1-7d
            transfer_units_at(addr(1), addr(2), 10.0, Some(NOW - 2 * WEEK)), // 1-4w
            transfer_units_at(addr(1), addr(2), 10.0, Some(NOW - 2 * MONTH)), // 1-3m
            transfer_units_at(addr(1), addr(2), 10.0, Some(NOW - 4 * MONTH)), // 3-6m
            transfer_units_at(addr(1), addr(2), 10.0, Some(NOW - 8 * MONTH)), // 6-12m
            transfer_units_at(addr(1), addr(2), 10.0, Some(NOW - 2 * YEAR)), // >1y
        ];

        let waves = bucketize(&records, NOW, supply(1000.0), 18);
        assert!((waves.less_than_1d - 1.0).abs() < 1e-9);
        assert!((waves.d1_to_7 - 1.0).abs() < 1e-9);
        assert!((waves.w1_to_4 - 1.0).abs() < 1e-9);
        assert!((waves.m1_to_3 - 1.0).abs() < 1e-9);
        assert!((waves.m3_to_6 - 1.0).abs() < 1e-9);
        assert!((waves.m6_to_12 - 1.0).abs() < 1e-9);
        assert!((waves.more_than_1y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_timestamps_skipped() {
        let records = vec![
            transfer_units_at(addr(1), addr(2), 500.0, None),
            transfer_units_at(addr(1), addr(2), 100.0, Some(NOW - 3_600)),
        ];
        let waves = bucketize(&records, NOW, supply(1000.0), 18);
        assert!((waves.less_than_1d - 10.0).abs() < 1e-9);
        assert_eq!(waves.d1_to_7, 0.0);
    }

    #[test]
    fn test_zero_supply_all_zero() {
        let records = vec![transfer_units_at(addr(1), addr(2), 10.0, Some(NOW))];
        let waves = bucketize(&records, NOW, U256::ZERO, 18);
        assert_eq!(waves.less_than_1d, 0.0);
        assert_eq!(waves.more_than_1y, 0.0);
    }

    #[test]
    fn test_future_timestamp_lands_in_freshest_bucket() {
        // Clock skew between providers can put a block slightly ahead of now.
        let records = vec![transfer_units_at(addr(1), addr(2), 10.0, Some(NOW + 30))];
        let waves = bucketize(&records, NOW, supply(1000.0), 18);
        assert!(waves.less_than_1d > 0.0);
    }
}

// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pure valuation indicators: MVRV, NUPL, NVT.
//!
//! Input to output, no I/O, no hidden state: identical inputs give
//! bit-identical outputs.

use serde::Serialize;

/// Stand-in for true realized-price cost-basis tracking: realized value is
/// taken as a fixed fraction of market value. Documented simplification.
const REALIZED_VALUE_FACTOR: f64 = 0.7;

/// Valuation band shared by MVRV and NVT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Valuation {
    Overvalued,
    Undervalued,
    #[default]
    Fair,
}

/// NUPL sentiment band. The default is the band a zeroed value falls in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NuplPhase {
    Euphoria,
    Optimism,
    Hope,
    Fear,
    #[default]
    Capitulation,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MvrvMetrics {
    pub ratio: f64,
    pub market_value: f64,
    pub realized_value: f64,
    pub interpretation: Valuation,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NuplMetrics {
    /// Net unrealized profit/loss, clamped to [-1, 1].
    pub value: f64,
    pub interpretation: NuplPhase,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NvtMetrics {
    pub ratio: f64,
    pub ratio_30d: f64,
    pub interpretation: Valuation,
}

/// Market value to realized value, on the fixed-fraction realized model.
pub fn mvrv(price_usd: f64, total_supply_units: f64) -> MvrvMetrics {
    let market_value = price_usd * total_supply_units;
    let realized_value = market_value * REALIZED_VALUE_FACTOR;
    let ratio = if realized_value > 0.0 {
        market_value / realized_value
    } else {
        0.0
    };

    let interpretation = if ratio > 3.5 {
        Valuation::Overvalued
    } else if ratio < 1.0 {
        Valuation::Undervalued
    } else {
        Valuation::Fair
    };

    MvrvMetrics {
        ratio,
        market_value,
        realized_value,
        interpretation,
    }
}

/// Net unrealized profit/loss from MVRV's market and realized values.
pub fn nupl(mvrv: &MvrvMetrics) -> NuplMetrics {
    let value = if mvrv.market_value > 0.0 {
        ((mvrv.market_value - mvrv.realized_value) / mvrv.market_value).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let interpretation = if value > 0.75 {
        NuplPhase::Euphoria
    } else if value > 0.5 {
        NuplPhase::Optimism
    } else if value > 0.25 {
        NuplPhase::Hope
    } else if value > 0.0 {
        NuplPhase::Fear
    } else {
        NuplPhase::Capitulation
    };

    NuplMetrics {
        value,
        interpretation,
    }
}

/// Network value to transactions, from market cap and 30-day USD volume.
/// A zero 30-day volume yields all-zero output with a `fair` band instead
/// of dividing by zero.
pub fn nvt(market_cap: f64, volume_30d: f64) -> NvtMetrics {
    if volume_30d <= 0.0 {
        return NvtMetrics::default();
    }

    let daily_volume = volume_30d / 30.0;
    let ratio = market_cap / daily_volume;
    let ratio_30d = market_cap / volume_30d;

    let interpretation = if ratio > 95.0 {
        Valuation::Overvalued
    } else if ratio < 20.0 {
        Valuation::Undervalued
    } else {
        Valuation::Fair
    };

    NvtMetrics {
        ratio,
        ratio_30d,
        interpretation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mvrv_reference_scenario() {
        // 1,000,000 tokens at $2.00.
        let m = mvrv(2.0, 1_000_000.0);
        assert!((m.market_value - 2_000_000.0).abs() < 1e-6);
        assert!((m.realized_value - 1_400_000.0).abs() < 1e-6);
        assert!((m.ratio - 1.0 / 0.7).abs() < 1e-9);
        assert_eq!(m.interpretation, Valuation::Fair);

        let n = nupl(&m);
        assert!((n.value - 0.3).abs() < 1e-9);
        assert_eq!(n.interpretation, NuplPhase::Hope);
    }

    #[test]
    fn test_mvrv_zero_supply() {
        let m = mvrv(2.0, 0.0);
        assert_eq!(m.market_value, 0.0);
        assert_eq!(m.ratio, 0.0);
        assert!(m.ratio.is_finite());
    }

    #[test]
    fn test_nupl_clamped_under_extreme_inputs() {
        let extreme = MvrvMetrics {
            ratio: 0.0,
            market_value: 1.0,
            realized_value: 1e18,
            interpretation: Valuation::Fair,
        };
        let n = nupl(&extreme);
        assert_eq!(n.value, -1.0);
        assert_eq!(n.interpretation, NuplPhase::Capitulation);

        let other = MvrvMetrics {
            ratio: 0.0,
            market_value: 1e18,
            realized_value: -1e18,
            interpretation: Valuation::Fair,
        };
        assert_eq!(nupl(&other).value, 1.0);
    }

    #[test]
    fn test_nupl_zero_market_value_guard() {
        let zeroed = MvrvMetrics::default();
        let n = nupl(&zeroed);
        assert_eq!(n.value, 0.0);
        assert!(n.value.is_finite());
    }

    #[test]
    fn test_nupl_bands() {
        let phase = |value: f64| {
            let m = MvrvMetrics {
                ratio: 0.0,
                market_value: 1.0,
                realized_value: 1.0 - value,
                interpretation: Valuation::Fair,
            };
            nupl(&m).interpretation
        };
        assert_eq!(phase(0.8), NuplPhase::Euphoria);
        assert_eq!(phase(0.6), NuplPhase::Optimism);
        assert_eq!(phase(0.3), NuplPhase::Hope);
        assert_eq!(phase(0.1), NuplPhase::Fear);
        assert_eq!(phase(0.0), NuplPhase::Capitulation);
        assert_eq!(phase(-0.5), NuplPhase::Capitulation);
    }

    #[test]
    fn test_nvt_zero_volume_guard() {
        let n = nvt(1_000_000.0, 0.0);
        assert_eq!(n.ratio, 0.0);
        assert_eq!(n.ratio_30d, 0.0);
        assert_eq!(n.interpretation, Valuation::Fair);
    }

    #[test]
    fn test_nvt_bands() {
        // daily volume = 1000; ratio = market_cap / 1000.
        assert_eq!(nvt(100_000.0, 30_000.0).interpretation, Valuation::Overvalued);
        assert_eq!(nvt(10_000.0, 30_000.0).interpretation, Valuation::Undervalued);
        assert_eq!(nvt(50_000.0, 30_000.0).interpretation, Valuation::Fair);
    }

    #[test]
    fn test_idempotent() {
        let a = mvrv(3.17, 123_456.789);
        let b = mvrv(3.17, 123_456.789);
        assert_eq!(a.ratio.to_bits(), b.ratio.to_bits());
        assert_eq!(a.market_value.to_bits(), b.market_value.to_bits());
        assert_eq!(nupl(&a).value.to_bits(), nupl(&b).value.to_bits());

        let x = nvt(9_999_999.0, 77_777.0);
        let y = nvt(9_999_999.0, 77_777.0);
        assert_eq!(x.ratio.to_bits(), y.ratio.to_bits());
        assert_eq!(x.ratio_30d.to_bits(), y.ratio_30d.to_bits());
    }
}

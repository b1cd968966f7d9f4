// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sampled holder-distribution estimation.
//!
//! Approximates ownership concentration without a full indexer: candidate
//! holders are harvested from recent transfer recipients, a bounded sample
//! of current balances is taken, and the shares/Gini figures are computed
//! over that sample. All outputs are sample-level approximations, not
//! population statistics.

use std::collections::HashSet;

use alloy::primitives::Address;
use serde::Serialize;

use crate::fetcher::TransferRecord;

/// Cap on candidate addresses harvested from the transfer window.
pub const CANDIDATE_CAP: usize = 1000;
/// Cap on balance queries per estimation, bounding RPC call volume.
pub const SAMPLE_CAP: usize = 100;

/// Concentration tier derived from top-10 share and Gini.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcentrationRisk {
    #[default]
    Low,
    Medium,
    High,
}

/// Holder-concentration estimate over a balance sample.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderDistribution {
    /// Top-10 sampled balances as a percentage of total supply.
    pub top10_percent: f64,
    /// All sampled balances (at most 100) as a percentage of total supply.
    pub top100_holders: f64,
    /// Sample Gini, clamped to [0, 1].
    pub gini_coefficient: f64,
    pub concentration_risk: ConcentrationRisk,
}

/// Harvest candidate holders: every address that appeared as a recipient,
/// zero address excluded, first-seen order, capped at [`CANDIDATE_CAP`].
pub fn candidate_holders(records: &[TransferRecord]) -> Vec<Address> {
    let mut seen: HashSet<Address> = HashSet::new();
    let mut candidates = Vec::new();
    for record in records {
        if record.to == Address::ZERO {
            continue;
        }
        if seen.insert(record.to) {
            candidates.push(record.to);
            if candidates.len() >= CANDIDATE_CAP {
                break;
            }
        }
    }
    candidates
}

/// Compute the distribution estimate from sampled balances (decimal units).
pub fn distribution_from_balances(balances: &[f64], total_supply_units: f64) -> HolderDistribution {
    if balances.is_empty() || total_supply_units <= 0.0 {
        return HolderDistribution::default();
    }

    let mut sorted: Vec<f64> = balances.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let top10: f64 = sorted.iter().take(10).sum();
    let top100: f64 = sorted.iter().take(SAMPLE_CAP).sum();

    let top10_percent = top10 / total_supply_units * 100.0;
    let top100_holders = top100 / total_supply_units * 100.0;
    let gini = gini_coefficient(&sorted, total_supply_units);

    HolderDistribution {
        top10_percent,
        top100_holders,
        gini_coefficient: gini,
        concentration_risk: concentration_risk(top10_percent, gini),
    }
}

/// Discrete Gini over a descending-balance sample:
/// `1 - (2 * sum of cumulative supply shares) / n^2`, clamped to [0, 1].
/// Inherited formula, kept verbatim; it is an approximation over the
/// sample and makes no population-level accuracy claim.
fn gini_coefficient(sorted_desc: &[f64], total_supply_units: f64) -> f64 {
    let n = sorted_desc.len() as f64;
    if n == 0.0 || total_supply_units <= 0.0 {
        return 0.0;
    }

    let mut cumulative = 0.0;
    let mut cumulative_sum = 0.0;
    for balance in sorted_desc {
        cumulative += balance / total_supply_units;
        cumulative_sum += cumulative;
    }

    (1.0 - (2.0 * cumulative_sum) / (n * n)).clamp(0.0, 1.0)
}

/// Tier thresholds: high when top-10 > 50% or Gini > 0.8, medium when
/// top-10 > 30% or Gini > 0.6, low otherwise.
pub fn concentration_risk(top10_percent: f64, gini: f64) -> ConcentrationRisk {
    if top10_percent > 50.0 || gini > 0.8 {
        ConcentrationRisk::High
    } else if top10_percent > 30.0 || gini > 0.6 {
        ConcentrationRisk::Medium
    } else {
        ConcentrationRisk::Low
    }
}

// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-window metric aggregators and pure indicator calculators.
//!
//! Every aggregator consumes an independently fetched transfer window and
//! owns no shared state, so the assembler can run them concurrently.

pub mod active;
pub mod flows;
pub mod hodl;
pub mod holders;
pub mod indicators;
pub mod volume;
pub mod whale;

pub use flows::ExchangeFlows;
pub use hodl::HodlWaves;
pub use holders::{ConcentrationRisk, HolderDistribution};
pub use indicators::{MvrvMetrics, NuplMetrics, NvtMetrics};
pub use whale::WhaleActivity;

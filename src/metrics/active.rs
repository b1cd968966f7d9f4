// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Active-address counting over a transfer window.

use std::collections::HashSet;

use alloy::primitives::Address;

use crate::fetcher::TransferRecord;

/// Count distinct non-zero addresses appearing as sender or recipient.
///
/// The zero address (mint/burn sentinel) is always excluded. Set-based, so
/// the result is invariant to record order. Daily/weekly/monthly counts are
/// produced by three independent calls over three freshly fetched windows,
/// never by merging smaller windows.
pub fn count_active(records: &[TransferRecord]) -> u64 {
    let mut addresses: HashSet<Address> = HashSet::new();
    for record in records {
        if record.from != Address::ZERO {
            addresses.insert(record.from);
        }
        if record.to != Address::ZERO {
            addresses.insert(record.to);
        }
    }
    addresses.len() as u64
}

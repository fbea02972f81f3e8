// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `stats` module defines the per-decode statistics record.

/// Counters accumulated over one decode call. Error-correcting stages add to these; stages
/// without FEC leave the record untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecodeStats {
    /// Number of symbol or bit errors that were corrected.
    pub resolved_errors: u32,
    /// Number of errors that could not be corrected (fatal blocks, checksum mismatches).
    pub unresolved_errors: u32,
    /// Accumulated correction amount. Divided by the weight it gives a normalised channel
    /// stress metric in [0, 1].
    pub fec_accumulated_amount: f32,
    /// Accumulated correction capacity of the blocks seen.
    pub fec_accumulated_weight: f32,
}

impl DecodeStats {
    pub fn new() -> Self {
        Default::default()
    }

    /// Normalised channel quality over the decode, or `None` when no FEC stage contributed.
    pub fn fec_stress(&self) -> Option<f32> {
        if self.fec_accumulated_weight > 0.0 {
            Some((self.fec_accumulated_amount / self.fec_accumulated_weight).clamp(0.0, 1.0))
        }
        else {
            None
        }
    }

    pub fn reset(&mut self) {
        *self = Default::default();
    }
}

// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Maps bytes onto pulse-amplitude symbols at 1, 2 or 8 bits per pixel.
//!
//! One-bit pixels expand each byte to eight symbols, MSB first. Two-bit pixels expand each
//! byte to four Gray-coded tuples so neighbouring amplitude levels differ by a single bit;
//! the lookup table is its own inverse. Eight-bit pixels carry bytes unchanged.

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{invalid_property_error, missing_property_error, Result};
use reelcode_core::stats::DecodeStats;

/// Gray mapping of 2-bit tuples to amplitude levels. Self-inverse.
const GRAY_LUT: [u8; 4] = [0, 1, 3, 2];

/// Bytes to pixel symbols at the given depth. `None` for unsupported depths.
pub(crate) fn modulate(bits: u32, src: &[u8]) -> Option<Vec<u8>> {
    match bits {
        1 => {
            let mut out = Vec::with_capacity(8 * src.len());
            for &byte in src {
                for bit in 0..8 {
                    out.push(byte >> (7 - bit) & 1);
                }
            }
            Some(out)
        }
        2 => {
            let mut out = Vec::with_capacity(4 * src.len());
            for &byte in src {
                for tuple in 0..4 {
                    out.push(GRAY_LUT[(byte >> ((3 - tuple) * 2) & 0x03) as usize]);
                }
            }
            Some(out)
        }
        8 => Some(src.to_vec()),
        _ => None,
    }
}

/// Pixel symbols back to bytes. One-bit input may end in a partial group, which packs high;
/// two-bit input is truncated to whole bytes first.
pub(crate) fn demodulate(bits: u32, src: &[u8]) -> Option<Vec<u8>> {
    match bits {
        1 => {
            let mut out = Vec::with_capacity(src.len().div_ceil(8));
            for chunk in src.chunks(8) {
                let mut byte = 0u8;
                for (bit, &symbol) in chunk.iter().enumerate() {
                    byte |= (symbol & 1) << (7 - bit);
                }
                out.push(byte);
            }
            Some(out)
        }
        2 => {
            let aligned = src.len() - src.len() % 4;
            let mut out = Vec::with_capacity(aligned / 4);
            for chunk in src[..aligned].chunks_exact(4) {
                let mut byte = 0u8;
                for &symbol in chunk {
                    byte = byte << 2 | GRAY_LUT[(symbol & 0x03) as usize];
                }
                out.push(byte);
            }
            Some(out)
        }
        8 => Some(src.to_vec()),
        _ => None,
    }
}

pub struct ModulatorCodec {
    spec: CodecSpec,
    num_bits_per_pixel: u32,
}

impl ModulatorCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let Some(bits) = properties.u32_value(keys::NUM_BITS_PER_PIXEL) else {
            return missing_property_error(keys::NUM_BITS_PER_PIXEL);
        };
        if bits == 0 || bits > 8 {
            return invalid_property_error("modulator: bits per pixel out of range");
        }

        let spec = CodecSpec {
            decoded_block_size: 1,
            encoded_block_size: (8 / bits) as usize,
            decoded_symbol_size: 8,
            encoded_symbol_size: bits,
            ..Default::default()
        };

        Ok(ModulatorCodec { spec, num_bits_per_pixel: bits })
    }
}

impl Codec for ModulatorCodec {
    fn name(&self) -> &'static str {
        "Modulator"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        if self.num_bits_per_pixel == 8 {
            return Ok(());
        }
        match modulate(self.num_bits_per_pixel, buf.as_slice()) {
            Some(out) => {
                buf.replace(out, 1);
                Ok(())
            }
            None => invalid_property_error("modulator: unsupported bits per pixel"),
        }
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        _stats: &mut DecodeStats,
    ) -> Result<()> {
        if self.num_bits_per_pixel == 8 {
            return Ok(());
        }
        match demodulate(self.num_bits_per_pixel, buf.as_slice()) {
            Some(out) => {
                buf.replace(out, 1);
                Ok(())
            }
            None => invalid_property_error("modulator: unsupported bits per pixel"),
        }
    }
}

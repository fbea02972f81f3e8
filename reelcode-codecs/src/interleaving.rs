// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intra-frame distance interleaving at bit or byte granularity.
//!
//! The buffer is treated as a matrix of `distance` rows filled row-major and emitted
//! column-major, spreading burst damage across distant positions of the frame. Decode applies
//! the inverse permutation.

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{
    invalid_property_error, misaligned_error, missing_property_error, Result,
};
use reelcode_core::stats::DecodeStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Symbol {
    Bit,
    Byte,
}

pub struct InterleavingCodec {
    spec: CodecSpec,
    distance: usize,
    symbol: Symbol,
}

impl InterleavingCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let Some(distance) = properties.usize_value(keys::DISTANCE) else {
            return missing_property_error(keys::DISTANCE);
        };
        if distance == 0 {
            return invalid_property_error("interleaving: distance must be non-zero");
        }

        let symbol = match properties.str_value(keys::SYMBOL_TYPE) {
            None | Some(keys::SYMBOL_TYPE_BYTE) => Symbol::Byte,
            Some(keys::SYMBOL_TYPE_BIT) => Symbol::Bit,
            Some(_) => return invalid_property_error("interleaving: unknown symbol type"),
        };

        // Block sizes of one distance keep the buffer a whole matrix.
        let spec = CodecSpec {
            decoded_block_size: distance,
            encoded_block_size: distance,
            decoded_symbol_size: if symbol == Symbol::Bit { 1 } else { 8 },
            encoded_symbol_size: if symbol == Symbol::Bit { 1 } else { 8 },
            ..Default::default()
        };

        Ok(InterleavingCodec { spec, distance, symbol })
    }

    /// Map every symbol at row-major position `r*cols + c` to column-major `c*rows + r`, or
    /// back when `forward` is false.
    fn permute(&self, buf: &mut DataBuffer, forward: bool) -> Result<()> {
        if buf.len_bytes() % self.distance != 0 {
            return misaligned_error("interleaving: input is not a whole matrix");
        }

        match self.symbol {
            Symbol::Byte => {
                let src = buf.as_slice().to_vec();
                let rows = self.distance;
                let cols = src.len() / rows;
                let dst = buf.as_slice_mut();

                for r in 0..rows {
                    for c in 0..cols {
                        if forward {
                            dst[c * rows + r] = src[r * cols + c];
                        }
                        else {
                            dst[r * cols + c] = src[c * rows + r];
                        }
                    }
                }
            }
            Symbol::Bit => {
                let src = buf.as_slice().to_vec();
                let rows = self.distance;
                let bits = 8 * src.len();
                let cols = bits / rows;
                let dst = buf.as_slice_mut();
                for byte in dst.iter_mut() {
                    *byte = 0;
                }

                for r in 0..rows {
                    for c in 0..cols {
                        let (from, to) = if forward {
                            (r * cols + c, c * rows + r)
                        }
                        else {
                            (c * rows + r, r * cols + c)
                        };
                        if src[from / 8] & (0x80 >> (from % 8)) != 0 {
                            dst[to / 8] |= 0x80 >> (to % 8);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Codec for InterleavingCodec {
    fn name(&self) -> &'static str {
        "Interleaving"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        self.permute(buf, true)
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        _stats: &mut DecodeStats,
    ) -> Result<()> {
        self.permute(buf, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::Config;

    fn codec(distance: usize, symbol: &str) -> InterleavingCodec {
        let mut properties = Properties::new();
        properties.insert(keys::DISTANCE, distance);
        properties.insert(keys::SYMBOL_TYPE, symbol);
        InterleavingCodec::try_new(&properties, &Config::new()).unwrap()
    }

    #[test]
    fn verify_byte_permutation() {
        let mut il = codec(3, "byte");

        // 3 rows by 4 columns, row-major in.
        let mut buf = DataBuffer::from_bytes(vec![0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23]);
        il.encode(&mut buf).unwrap();
        // Column-major out.
        assert_eq!(buf.as_slice(), &[0, 10, 20, 1, 11, 21, 2, 12, 22, 3, 13, 23]);

        let mut stats = DecodeStats::new();
        il.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &[0, 1, 2, 3, 10, 11, 12, 13, 20, 21, 22, 23]);
    }

    #[test]
    fn verify_bit_round_trip() {
        let mut il = codec(4, "bit");
        let payload: Vec<u8> = (0..32).map(|i| (i as u8).wrapping_mul(37)).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        il.encode(&mut buf).unwrap();
        assert_ne!(buf.as_slice(), &payload[..]);

        let mut stats = DecodeStats::new();
        il.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_bit_mode_spreads_adjacent_bits() {
        let mut il = codec(8, "bit");

        // A single set byte is eight adjacent bits; after interleaving they land one per row.
        let mut data = vec![0u8; 8];
        data[0] = 0xff;
        let mut buf = DataBuffer::from_bytes(data);
        il.encode(&mut buf).unwrap();

        // 8 rows by 8 columns: row 0 holds bits 0..8 of the input, so column 0 of every
        // output row group is set.
        assert_eq!(buf.as_slice(), &[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80]);
    }

    #[test]
    fn verify_misaligned_matrix_is_rejected() {
        let mut il = codec(3, "byte");
        let mut buf = DataBuffer::from_bytes(vec![0; 10]);
        assert!(il.encode(&mut buf).is_err());
    }
}

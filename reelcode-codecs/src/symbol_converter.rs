// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Repacks groups of five bytes into eight 5-bit symbols for five-level carriers, and back.
//!
//! Each input group is read as a 40-bit string, most significant bit first; output symbol k
//! carries bits 39−5k .. 35−5k in its low five bits. Working at byte granularity keeps the
//! transform independent of the host byte order.

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecSpec};
use reelcode_core::config::{Config, Properties};
use reelcode_core::errors::{misaligned_error, Result};
use reelcode_core::stats::DecodeStats;

pub struct SymbolConverterCodec {
    spec: CodecSpec,
}

impl SymbolConverterCodec {
    pub fn try_new(_properties: &Properties, _config: &Config) -> Result<Self> {
        let spec = CodecSpec {
            decoded_block_size: 5,
            encoded_block_size: 8,
            decoded_symbol_size: 8,
            encoded_symbol_size: 5,
            ..Default::default()
        };
        Ok(SymbolConverterCodec { spec })
    }
}

impl Codec for SymbolConverterCodec {
    fn name(&self) -> &'static str {
        "SymbolConverter"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        if buf.len_bytes() % 5 != 0 {
            return misaligned_error("symbol converter: input is not a multiple of 5 bytes");
        }

        let mut out = Vec::with_capacity(buf.len_bytes() / 5 * 8);
        for group in buf.as_slice().chunks_exact(5) {
            let mut acc = 0u64;
            for &byte in group {
                acc = acc << 8 | u64::from(byte);
            }
            for k in 0..8 {
                out.push((acc >> (35 - 5 * k) & 0x1f) as u8);
            }
        }

        buf.replace(out, 1);
        Ok(())
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        _stats: &mut DecodeStats,
    ) -> Result<()> {
        if buf.len_bytes() % 8 != 0 {
            return misaligned_error("symbol converter: input is not a multiple of 8 symbols");
        }

        let mut out = Vec::with_capacity(buf.len_bytes() / 8 * 5);
        for group in buf.as_slice().chunks_exact(8) {
            let mut acc = 0u64;
            for &symbol in group {
                acc = acc << 5 | u64::from(symbol & 0x1f);
            }
            for k in 0..5 {
                out.push((acc >> (32 - 8 * k)) as u8);
            }
        }

        buf.replace(out, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::Config;

    fn codec() -> SymbolConverterCodec {
        SymbolConverterCodec::try_new(&Properties::new(), &Config::new()).unwrap()
    }

    #[test]
    fn verify_round_trip() {
        let mut converter = codec();
        let payload = vec![0x12, 0x34, 0x56, 0x78, 0x9a];

        let mut buf = DataBuffer::from_bytes(payload.clone());
        converter.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 8);
        assert!(buf.as_slice().iter().all(|&s| s < 32));

        let mut stats = DecodeStats::new();
        converter.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_bit_grouping() {
        let mut converter = codec();

        // 0xFF 0x00 0x00 0x00 0x00: the top eight bits fill symbol 0 and the top three bits
        // of symbol 1.
        let mut buf = DataBuffer::from_bytes(vec![0xff, 0, 0, 0, 0]);
        converter.encode(&mut buf).unwrap();
        assert_eq!(buf.as_slice(), &[0x1f, 0x1c, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn verify_misaligned_input_is_rejected() {
        let mut converter = codec();

        let mut buf = DataBuffer::from_bytes(vec![0; 7]);
        assert!(converter.encode(&mut buf).is_err());

        let mut stats = DecodeStats::new();
        let mut buf = DataBuffer::from_bytes(vec![0; 12]);
        assert!(converter.decode(&mut buf, &[], &mut stats).is_err());
    }
}

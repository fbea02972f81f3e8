// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The composite wire-side stage for PAM carriers: payload bytes are modulated to pixel
//! symbols at the configured depth, then the fiducial marks are inserted into the frame
//! bitmap. Decode strips the fiducials and demodulates.

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecFlags, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{
    invalid_property_error, misaligned_error, missing_property_error, Result,
};
use reelcode_core::stats::DecodeStats;

use crate::modulator::{demodulate, modulate};
use crate::sync_point::SyncPointInserterCodec;

pub struct Pam2dCodec {
    spec: CodecSpec,
    bits_per_pixel: u32,
    inserter: SyncPointInserterCodec,
}

impl Pam2dCodec {
    pub fn try_new(properties: &Properties, config: &Config) -> Result<Self> {
        let Some(bits) = properties.u32_value(keys::NUM_BITS_PER_PIXEL) else {
            return missing_property_error(keys::NUM_BITS_PER_PIXEL);
        };
        if bits != 1 && bits != 2 && bits != 8 {
            return invalid_property_error("2dpam: bits per pixel must be 1, 2 or 8");
        }

        let inserter = SyncPointInserterCodec::try_new(properties, config)?;

        let mut flags = CodecSpec::default().flags;
        flags.remove(CodecFlags::REENTRANT);
        let spec = CodecSpec {
            flags,
            decoded_symbol_size: 8,
            encoded_symbol_size: bits,
            ..Default::default()
        };

        Ok(Pam2dCodec { spec, bits_per_pixel: bits, inserter })
    }

    fn symbols_per_byte(&self) -> usize {
        (8 / self.bits_per_pixel) as usize
    }
}

impl Codec for Pam2dCodec {
    fn name(&self) -> &'static str {
        "2DPAM"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn init_capacity(&mut self, size: usize) -> Result<()> {
        self.inserter.init_capacity(size)?;

        // Pixels left for data, rounded down to whole payload bytes.
        let data_bytes = self.inserter.data_pixels() / self.symbols_per_byte();
        let spec = self.spec_mut();
        spec.encoded_block_size = size;
        spec.encoded_data_size = size;
        spec.decoded_block_size = data_bytes;
        spec.decoded_data_size = data_bytes;
        Ok(())
    }

    fn reset(&mut self) {
        self.inserter.reset();
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        if buf.len_bytes() != self.spec.decoded_data_size {
            return misaligned_error("2dpam: payload does not fill the frame");
        }

        let Some(mut symbols) = modulate(self.bits_per_pixel, buf.as_slice()) else {
            return invalid_property_error("2dpam: unsupported bits per pixel");
        };
        symbols.resize(self.inserter.data_pixels(), 0);

        buf.replace(symbols, 1);
        self.inserter.encode(buf)
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        erasures: &[usize],
        stats: &mut DecodeStats,
    ) -> Result<()> {
        self.inserter.decode(buf, erasures, stats)?;

        let used = self.spec.decoded_data_size * self.symbols_per_byte();
        let Some(out) = demodulate(self.bits_per_pixel, &buf.as_slice()[..used]) else {
            return invalid_property_error("2dpam: unsupported bits per pixel");
        };

        buf.replace(out, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::Config;

    fn codec(bits: u32) -> Pam2dCodec {
        let mut properties = Properties::new();
        properties.insert(keys::NUM_BITS_PER_PIXEL, bits);
        properties.insert(keys::IMAGE_WIDTH, 32usize);
        properties.insert(keys::IMAGE_HEIGHT, 16usize);
        properties.insert(keys::SYNC_POINT_RADIUS, 1usize);
        properties.insert(keys::SYNC_POINT_H_DISTANCE, 16usize);
        properties.insert(keys::SYNC_POINT_V_DISTANCE, 8usize);
        Pam2dCodec::try_new(&properties, &Config::new()).unwrap()
    }

    #[test]
    fn verify_capacity_split() {
        let mut pam = codec(1);
        pam.init_capacity(512).unwrap();

        // 4 fiducials of 5 pixels leave 492 data pixels: 61 whole bytes at one bit per pixel.
        assert_eq!(pam.spec().encoded_data_size, 512);
        assert_eq!(pam.spec().decoded_data_size, 61);
    }

    #[test]
    fn verify_round_trip_bilevel() {
        let mut pam = codec(1);
        pam.init_capacity(512).unwrap();

        let payload: Vec<u8> = (0..61).map(|i| (i as u8).wrapping_mul(29)).collect();
        let mut buf = DataBuffer::from_bytes(payload.clone());
        pam.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 512);
        assert!(buf.as_slice().iter().all(|&s| s <= 1));

        let mut stats = DecodeStats::new();
        pam.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_round_trip_gray_levels() {
        let mut pam = codec(2);
        pam.init_capacity(512).unwrap();
        let data_bytes = pam.spec().decoded_data_size;

        let payload: Vec<u8> = (0..data_bytes).map(|i| (i as u8) ^ 0x3c).collect();
        let mut buf = DataBuffer::from_bytes(payload.clone());
        pam.encode(&mut buf).unwrap();
        assert!(buf.as_slice().iter().all(|&s| s <= 3));

        let mut stats = DecodeStats::new();
        pam.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_wrong_capacity_is_rejected() {
        let mut pam = codec(1);
        assert!(pam.init_capacity(500).is_err());
    }
}

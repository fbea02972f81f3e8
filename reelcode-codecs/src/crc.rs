// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CRC-32 and CRC-64 integrity stages. Encode appends the little-endian checksum of the frame;
//! decode verifies and strips it, counting a mismatch as one unresolved error without touching
//! the payload.

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{misaligned_error, Result};
use reelcode_core::math::{crc32, crc64, Crc32, Crc64};
use reelcode_core::stats::DecodeStats;

macro_rules! crc_codec {
    ($codec:ident, $name:expr, $calc:ty, $int:ty, $default_seed:expr, $default_poly:expr, $size:expr) => {
        pub struct $codec {
            spec: CodecSpec,
            crc: $calc,
        }

        impl $codec {
            pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
                let seed = properties
                    .u64_value(keys::SEED)
                    .map(|v| v as $int)
                    .unwrap_or($default_seed);
                let polynom = properties
                    .u64_value(keys::POLYNOM)
                    .map(|v| v as $int)
                    .unwrap_or($default_poly);

                Ok($codec { spec: Default::default(), crc: <$calc>::new(seed, polynom) })
            }
        }

        impl Codec for $codec {
            fn name(&self) -> &'static str {
                $name
            }

            fn spec(&self) -> &CodecSpec {
                &self.spec
            }

            fn spec_mut(&mut self) -> &mut CodecSpec {
                &mut self.spec
            }

            // The checksum covers the whole frame, so the stage consumes the full capacity
            // rather than fixed blocks.
            fn init_capacity(&mut self, size: usize) -> Result<()> {
                if size < $size {
                    return misaligned_error("crc: capacity below the checksum width");
                }
                let spec = self.spec_mut();
                spec.encoded_block_size = size;
                spec.encoded_data_size = size;
                spec.decoded_block_size = size - $size;
                spec.decoded_data_size = size - $size;
                Ok(())
            }

            fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
                let crc = self.crc.calc(buf.as_slice());
                let len = buf.len_bytes();
                buf.resize_bytes(len + $size);
                buf.as_slice_mut()[len..].copy_from_slice(&crc.to_le_bytes());
                Ok(())
            }

            fn decode(
                &mut self,
                buf: &mut DataBuffer,
                _erasures: &[usize],
                stats: &mut DecodeStats,
            ) -> Result<()> {
                if buf.len_bytes() < $size {
                    return misaligned_error("crc: frame shorter than the checksum");
                }

                let payload_len = buf.len_bytes() - $size;
                let mut trailer = [0u8; $size];
                trailer.copy_from_slice(&buf.as_slice()[payload_len..]);
                let received = <$int>::from_le_bytes(trailer);

                let computed = self.crc.calc(&buf.as_slice()[..payload_len]);
                if computed != received {
                    stats.unresolved_errors += 1;
                }

                buf.resize_bytes(payload_len);
                Ok(())
            }
        }
    };
}

crc_codec!(Crc32Codec, "CRC32", Crc32, u32, 0xffff_ffff, crc32::POLY_CRC_32, 4);
crc_codec!(
    Crc64Codec,
    "CRC64",
    Crc64,
    u64,
    0xffff_ffff_ffff_ffff,
    crc64::POLY_CRC_64,
    8
);

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::Config;

    #[test]
    fn verify_append_and_strip() {
        let mut crc = Crc32Codec::try_new(&Properties::new(), &Config::new()).unwrap();

        let mut buf = DataBuffer::from_bytes(b"123456789".to_vec());
        crc.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 13);
        assert_eq!(&buf.as_slice()[9..], &0xCBF43926u32.to_le_bytes());

        let mut stats = DecodeStats::new();
        crc.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), b"123456789");
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn verify_any_single_bit_flip_is_detected() {
        let mut crc = Crc32Codec::try_new(&Properties::new(), &Config::new()).unwrap();

        let mut reference = DataBuffer::from_bytes(b"123456789".to_vec());
        crc.encode(&mut reference).unwrap();

        for bit in 0..8 * reference.len_bytes() {
            let mut buf = reference.clone();
            buf.as_slice_mut()[bit / 8] ^= 0x80 >> (bit % 8);

            let mut stats = DecodeStats::new();
            crc.decode(&mut buf, &[], &mut stats).unwrap();
            assert!(stats.unresolved_errors >= 1, "flip of bit {} went undetected", bit);
        }
    }

    #[test]
    fn verify_crc64_round_trip() {
        let mut crc = Crc64Codec::try_new(&Properties::new(), &Config::new()).unwrap();

        let payload: Vec<u8> = (0..100).collect();
        let mut buf = DataBuffer::from_bytes(payload.clone());
        crc.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 108);

        let mut stats = DecodeStats::new();
        crc.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn verify_capacity_accounts_for_trailer() {
        let mut crc = Crc64Codec::try_new(&Properties::new(), &Config::new()).unwrap();
        crc.init_capacity(128).unwrap();
        assert_eq!(crc.spec().encoded_data_size, 128);
        assert_eq!(crc.spec().decoded_data_size, 120);
    }
}

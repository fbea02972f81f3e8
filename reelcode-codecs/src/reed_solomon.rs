// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Systematic Reed-Solomon coding over GF(2^m) for m in {8, 9, 10}.
//!
//! Encoding streams each message block through an LFSR over the generator polynomial.
//! Decoding computes the syndromes, recovers the error-locator polynomial with the
//! Berlekamp-Massey iteration, evaluates the modified error evaluator, and locates errors by
//! Chien search over the whole field.

use log::{debug, warn};

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecFlags, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{
    invalid_property_error, misaligned_error, missing_property_error, Result,
};
use reelcode_core::math::GaloisField;
use reelcode_core::stats::DecodeStats;

/// The default primitive polynomial, x^8 + x^4 + x^3 + x^2 + 1 over GF(2^8).
const DEFAULT_POLYNOM: u32 = 0x11d;

/// The (n,k) code machinery, independent of buffer framing.
struct RsCode {
    gf: GaloisField,
    message_size: usize,
    parity_size: usize,
    generator: Vec<u32>,
}

/// Per-block decode outcome counters.
#[derive(Default)]
struct BlockOutcome {
    resolved: u32,
    fatal: u32,
    errors: u32,
}

impl RsCode {
    fn new(message_size: usize, parity_size: usize, prim_poly: u32) -> Result<RsCode> {
        let gf = GaloisField::new(prim_poly)?;

        // Generator polynomial g(x) = (x + a^1)(x + a^2)...(x + a^parity), low order first.
        let mut generator = vec![1u32];
        for i in 1..=parity_size as u32 {
            generator = gf.mul_poly(&[gf.exp(i), 1], &generator);
        }

        Ok(RsCode { gf, message_size, parity_size, generator })
    }

    fn block_size(&self) -> usize {
        self.message_size + self.parity_size
    }

    /// Encode one message block, producing its parity symbols.
    fn encode_block(&self, message: &[u32], parity: &mut [u32]) {
        let p = self.parity_size;
        let mut lfsr = vec![0u32; p + 1];

        for &symbol in message {
            let dbyte = symbol ^ lfsr[p - 1];
            for j in (1..p).rev() {
                lfsr[j] = lfsr[j - 1] ^ self.gf.mul(self.generator[j], dbyte);
            }
            lfsr[0] = self.gf.mul(self.generator[0], dbyte);
        }

        for (i, out) in parity.iter_mut().enumerate() {
            *out = lfsr[p - 1 - i];
        }
    }

    /// Correct one received block in place. Returns the per-block counters; on a fatal block
    /// the codeword is left untouched.
    fn decode_block(&self, codeword: &mut [u32]) -> BlockOutcome {
        let p = self.parity_size as u32;
        let mut outcome = BlockOutcome::default();

        let mut syndromes = vec![0u32; p as usize];
        let mut has_errors = false;
        for j in 1..=p {
            let mut sum = 0;
            for &symbol in codeword.iter() {
                sum = symbol ^ self.gf.roots_sum(j, sum);
            }
            syndromes[(j - 1) as usize] = sum;
            has_errors = has_errors || sum != 0;
        }

        if has_errors {
            let errors = self.correct_errors(codeword, &syndromes, &mut outcome);
            outcome.errors = errors;
        }
        outcome
    }

    /// Berlekamp-Massey over the syndrome sequence, producing the error-locator polynomial and
    /// the modified error evaluator.
    fn berlekamp_massey(&self, syndromes: &[u32]) -> (Vec<u32>, Vec<u32>) {
        let p = self.parity_size;
        let gf = &self.gf;

        let mut psi = vec![0u32; 2 * p];
        let mut psi2 = vec![0u32; 2 * p];
        let mut d_poly = vec![0u32; 2 * p];
        psi[0] = 1;
        d_poly[1] = 1;

        let mut k: i64 = -1;
        let mut l: usize = 0;

        for n in 0..p {
            let mut d = 0u32;
            for i in 0..=l {
                d ^= gf.mul(psi[i], syndromes[n - i]);
            }

            if d != 0 {
                for i in 0..2 * p {
                    psi2[i] = psi[i] ^ gf.mul(d, d_poly[i]);
                }

                if (l as i64) < (n as i64 - k) {
                    let l2 = (n as i64 - k) as usize;
                    k = n as i64 - l as i64;
                    let d_inv = gf.inv(d);
                    for i in 0..2 * p {
                        d_poly[i] = gf.mul(psi[i], d_inv);
                    }
                    l = l2;
                }

                psi.copy_from_slice(&psi2);
            }

            for i in (1..2 * p).rev() {
                d_poly[i] = d_poly[i - 1];
            }
            d_poly[0] = 0;
        }

        // Modified omega: the product of locator and syndromes, truncated to parity terms.
        let mut omega = vec![0u32; 2 * p];
        for i in 0..p {
            for j in i..p {
                omega[j] ^= gf.mul(syndromes[j - i], psi[i]);
            }
        }

        (psi, omega)
    }

    /// Chien search: evaluate the locator at every non-zero field element. Returns the error
    /// locations; a count exceeding the parity size aborts the search.
    fn find_roots(&self, locator: &[u32], locations: &mut Vec<u32>) -> u32 {
        let p = self.parity_size as u32;
        let gf = &self.gf;
        let mask = gf.mask();
        let mut count = 0u32;

        for r in 1..gf.alphabet_size() {
            let mut sum = 0;
            for k in 0..=p {
                sum ^= gf.roots_sum((k * r) % mask, locator[k as usize]);
            }
            if sum == 0 {
                // Beyond the parity size the root set is not reliable; report the overflow.
                if count >= p {
                    return count + 1;
                }
                locations.push(mask - r);
                count += 1;
            }
        }
        count
    }

    fn correct_errors(
        &self,
        codeword: &mut [u32],
        syndromes: &[u32],
        outcome: &mut BlockOutcome,
    ) -> u32 {
        let p = self.parity_size;
        let gf = &self.gf;
        let mask = gf.mask();

        let (locator, omega) = self.berlekamp_massey(syndromes);
        let mut locations = Vec::with_capacity(p);
        let count = self.find_roots(&locator, &mut locations);

        if count == 0 || count > p as u32 {
            if count > 0 {
                outcome.fatal += count;
            }
            return count;
        }

        // Any location outside the codeword marks the whole block fatal.
        if locations.iter().any(|&loc| loc as usize >= codeword.len()) {
            outcome.fatal += count;
            return count;
        }

        for &loc in locations.iter() {
            // Evaluate omega and the locator derivative at a^(-loc); odd powers of the
            // derivative vanish over GF(2^m).
            let mut num = 0u32;
            for (j, &w) in omega.iter().enumerate() {
                num ^= gf.mul(w, gf.exp((mask - loc) * j as u32 % mask));
            }

            let mut denom = 0u32;
            for j in (1..2 * p).step_by(2) {
                denom ^= gf.mul(locator[j], gf.exp((mask - loc) * (j as u32 - 1) % mask));
            }

            let err = gf.mul(num, gf.inv(denom));
            let at = codeword.len() - loc as usize - 1;
            codeword[at] ^= err;
        }

        outcome.resolved += count;
        count
    }
}

/// The Reed-Solomon pipeline stage. Blocks of `messageSize` symbols gain `byteParityNumber`
/// parity symbols; fields wider than 8 bits switch the buffer to 16-bit items.
pub struct ReedSolomonCodec {
    spec: CodecSpec,
    rs: RsCode,
    item_size: usize,
    max_errors_per_block: u32,
}

impl ReedSolomonCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let Some(message_size) = properties.usize_value(keys::MESSAGE_SIZE) else {
            return missing_property_error(keys::MESSAGE_SIZE);
        };
        let Some(parity_size) = properties.usize_value(keys::PARITY_SIZE) else {
            return missing_property_error(keys::PARITY_SIZE);
        };
        let polynom = properties.u32_value(keys::POLYNOM).unwrap_or(DEFAULT_POLYNOM);

        if message_size == 0 || parity_size == 0 {
            return invalid_property_error("reed-solomon: block geometry must be non-zero");
        }

        let rs = RsCode::new(message_size, parity_size, polynom)?;

        let m = rs.gf.degree();
        let item_size = match m {
            8 => 1,
            9 | 10 => 2,
            _ => return invalid_property_error("reed-solomon: field order must be 8, 9 or 10"),
        };

        if rs.block_size() > rs.gf.mask() as usize {
            return invalid_property_error("reed-solomon: block exceeds the field codeword bound");
        }

        let spec = CodecSpec {
            flags: CodecFlags::ERROR_CORRECTING | CodecFlags::PRE_ZERO_PAD | CodecFlags::REENTRANT,
            decoded_block_size: item_size * message_size,
            encoded_block_size: item_size * rs.block_size(),
            decoded_symbol_size: m,
            encoded_symbol_size: m,
            ..Default::default()
        };

        Ok(ReedSolomonCodec { spec, rs, item_size, max_errors_per_block: 0 })
    }

    /// The worst per-block error count seen by the most recent decode call.
    pub fn max_errors_per_block(&self) -> u32 {
        self.max_errors_per_block
    }

    fn read_symbol(&self, buf: &DataBuffer, index: usize) -> u32 {
        if self.item_size == 1 {
            u32::from(buf.as_slice()[index])
        }
        else {
            u32::from(buf.word(index))
        }
    }

    fn write_symbol(&self, buf: &mut DataBuffer, index: usize, value: u32) {
        if self.item_size == 1 {
            buf.as_slice_mut()[index] = value as u8;
        }
        else {
            buf.set_word(index, value as u16);
        }
    }
}

impl Codec for ReedSolomonCodec {
    fn name(&self) -> &'static str {
        "ReedSolomon"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        if buf.len_bytes() % self.spec.decoded_block_size != 0 {
            return misaligned_error("reed-solomon: input is not block aligned");
        }

        let message_size = self.rs.message_size;
        let block_size = self.rs.block_size();
        let blocks = buf.len_bytes() / self.spec.decoded_block_size;
        let alphabet = self.rs.gf.alphabet_size();

        let mut out = DataBuffer::new(self.item_size, blocks * block_size);
        let mut message = vec![0u32; message_size];
        let mut parity = vec![0u32; self.rs.parity_size];

        for block in 0..blocks {
            for (i, symbol) in message.iter_mut().enumerate() {
                *symbol = self.read_symbol(buf, block * message_size + i);
                if *symbol >= alphabet {
                    return misaligned_error("reed-solomon: symbol exceeds the field alphabet");
                }
            }

            self.rs.encode_block(&message, &mut parity);

            let base = block * block_size;
            for (i, &symbol) in message.iter().enumerate() {
                self.write_symbol(&mut out, base + i, symbol);
            }
            for (i, &symbol) in parity.iter().enumerate() {
                self.write_symbol(&mut out, base + message_size + i, symbol);
            }
        }

        *buf = out;
        Ok(())
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        stats: &mut DecodeStats,
    ) -> Result<()> {
        if buf.len_bytes() % self.spec.encoded_block_size != 0 {
            return misaligned_error("reed-solomon: input is not block aligned");
        }

        let message_size = self.rs.message_size;
        let block_size = self.rs.block_size();
        let blocks = buf.len_bytes() / self.spec.encoded_block_size;
        let mask = self.rs.gf.mask();

        let mut out = DataBuffer::new(self.item_size, blocks * message_size);
        let mut codeword = vec![0u32; block_size];
        self.max_errors_per_block = 0;

        let mut resolved = 0u32;
        let mut fatal = 0u32;

        for block in 0..blocks {
            for (i, symbol) in codeword.iter_mut().enumerate() {
                // Out-of-field words can only come from channel damage; clamp them into the
                // field and let the parity take care of the rest.
                *symbol = self.read_symbol(buf, block * block_size + i) & mask;
            }

            let outcome = self.rs.decode_block(&mut codeword);
            resolved += outcome.resolved;
            fatal += outcome.fatal;
            self.max_errors_per_block = self.max_errors_per_block.max(outcome.errors);

            for i in 0..message_size {
                self.write_symbol(&mut out, block * message_size + i, codeword[i]);
            }
        }

        if fatal > 0 {
            warn!("reed-solomon: {} apparent errors in uncorrectable blocks", fatal);
        }
        else if resolved > 0 {
            debug!("reed-solomon: corrected {} symbols", resolved);
        }

        stats.resolved_errors += resolved;
        stats.unresolved_errors += fatal;
        stats.fec_accumulated_amount += resolved as f32;
        stats.fec_accumulated_weight += (blocks * (self.rs.parity_size / 2)) as f32;

        *buf = out;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use reelcode_core::config::Config;

    fn codec(message: usize, parity: usize, polynom: u32) -> ReedSolomonCodec {
        let mut properties = Properties::new();
        properties.insert(keys::MESSAGE_SIZE, message);
        properties.insert(keys::PARITY_SIZE, parity);
        properties.insert(keys::POLYNOM, polynom);
        ReedSolomonCodec::try_new(&properties, &Config::new()).unwrap()
    }

    #[test]
    fn verify_construction_requires_geometry() {
        let mut properties = Properties::new();
        properties.insert(keys::MESSAGE_SIZE, 223usize);
        assert!(ReedSolomonCodec::try_new(&properties, &Config::new()).is_err());
    }

    #[test]
    fn verify_clean_round_trip() {
        let mut rs = codec(223, 32, 0x11d);
        let payload: Vec<u8> = (0..223).map(|i| (i as u8).wrapping_mul(7)).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        rs.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 255);
        // Systematic code: the message leads the block.
        assert_eq!(&buf.as_slice()[..223], &payload[..]);

        let mut stats = DecodeStats::new();
        rs.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.resolved_errors, 0);
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn verify_corrects_up_to_half_parity() {
        let mut rs = codec(223, 32, 0x11d);
        let payload: Vec<u8> = (0..223).map(|i| i as u8).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        rs.encode(&mut buf).unwrap();

        let mut rng = SmallRng::seed_from_u64(0x5eed);
        for _ in 0..16 {
            let at = rng.random_range(0..255);
            buf.as_slice_mut()[at] ^= rng.random_range(1..=255) as u8;
        }

        let mut stats = DecodeStats::new();
        rs.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.unresolved_errors, 0);
        assert!(stats.resolved_errors <= 16);
        assert!(rs.max_errors_per_block() <= 16);
    }

    #[test]
    fn verify_overload_does_not_silently_corrupt() {
        let mut rs = codec(223, 32, 0x11d);
        let payload: Vec<u8> = (0..223).map(|i| i as u8).collect();

        let mut buf = DataBuffer::from_bytes(payload);
        rs.encode(&mut buf).unwrap();

        // Push far past the correction radius.
        for i in 0..64 {
            buf.as_slice_mut()[3 * i] ^= 0xa5;
        }

        let mut stats = DecodeStats::new();
        rs.decode(&mut buf, &[], &mut stats).unwrap();
        // The stage must flag the failure rather than fabricate a clean block.
        assert!(stats.unresolved_errors > 0 || stats.resolved_errors > 0);
    }

    #[test]
    fn verify_wide_field_round_trip() {
        // GF(2^10), primitive polynomial x^10 + x^3 + 1.
        let mut rs = codec(20, 6, 0x409);
        let mut buf = DataBuffer::new(2, 20);
        for i in 0..20 {
            buf.set_word(i, (i as u16 * 41) % 1024);
        }
        let clean = buf.clone();

        rs.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), 26);
        assert_eq!(buf.item_size(), 2);

        buf.set_word(4, buf.word(4) ^ 0x3ff);
        buf.set_word(17, buf.word(17) ^ 0x155);

        let mut stats = DecodeStats::new();
        rs.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf, clean);
        assert_eq!(stats.resolved_errors, 2);
        assert_eq!(stats.unresolved_errors, 0);
    }
}

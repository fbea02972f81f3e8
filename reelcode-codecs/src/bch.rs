// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary BCH coding over GF(2^m), correcting up to t bit errors per block.
//!
//! The generator polynomial is the LCM of the minimal polynomials of the odd powers of α up to
//! α^(2t−1). Encoding reduces the data polynomial with a byte-wide remainder table. Decoding
//! recomputes the ECC of the received data and derives the syndromes from the ECC difference,
//! runs the Berlekamp-Massey iteration for the error locator, and finds its roots in closed
//! form for degrees one and two (via a linearised-equation basis table) or by Chien search for
//! higher degrees.

use log::{debug, warn};

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecFlags, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{
    invalid_property_error, misaligned_error, missing_property_error, Result,
};
use reelcode_core::math::GaloisField;
use reelcode_core::stats::DecodeStats;

/// Default primitive polynomials per field order, m in 5..=15.
const PRIM_POLY: [u32; 11] =
    [0x25, 0x43, 0x83, 0x11d, 0x211, 0x409, 0x805, 0x1053, 0x201b, 0x402b, 0x8003];

/// Archival frames are coded over GF(2^14) unless configured otherwise.
const DEFAULT_POLYNOM: u32 = 0x402b;

// Bit-polynomial helpers over u64 limbs, bit i holding the coefficient of x^i.

fn words_for(bits: usize) -> usize {
    bits.div_ceil(64)
}

fn get_bit(limbs: &[u64], i: usize) -> bool {
    limbs[i / 64] >> (i % 64) & 1 != 0
}

fn poly_degree(limbs: &[u64]) -> Option<usize> {
    for (w, &limb) in limbs.iter().enumerate().rev() {
        if limb != 0 {
            return Some(64 * w + 63 - limb.leading_zeros() as usize);
        }
    }
    None
}

/// result ^= p << s
fn xor_shifted(result: &mut [u64], p: &[u64], s: usize) {
    let (word, bit) = (s / 64, s % 64);
    for (i, &limb) in p.iter().enumerate() {
        if limb == 0 {
            continue;
        }
        result[i + word] ^= limb << bit;
        if bit != 0 && i + word + 1 < result.len() {
            result[i + word + 1] ^= limb >> (64 - bit);
        }
    }
}

/// The (m, t) code machinery, independent of buffer framing.
struct BchCode {
    gf: GaloisField,
    t: usize,
    /// Codeword bound in bits, 2^m − 1.
    n_bits: usize,
    /// Exact generator degree.
    ecc_bits: usize,
    ecc_bytes: usize,
    /// Generator polynomial without its leading term, for the bitwise LFSR step.
    gen_low: Vec<u64>,
    /// Byte-wide remainder table: entry b is (b(x) · x^ecc_bits) mod g(x).
    rem_tab: Vec<Vec<u64>>,
    /// Per basis bit k: whether 2^k has odd trace, and the solution of y² + y = 2^k (odd-trace
    /// bits solve against the reference element instead, pairing up in superposition).
    xi_tab: Vec<(bool, u32)>,
}

/// Outcome of decoding one block.
enum BlockDecode {
    Clean,
    Corrected(u32),
    Uncorrectable,
}

impl BchCode {
    fn new(t: usize, prim_poly: u32) -> Result<BchCode> {
        let gf = GaloisField::new(prim_poly)?;
        let m = gf.degree();
        if m < 5 || m > 15 {
            return invalid_property_error("bch: field order must be in 5..=15");
        }
        let n_bits = gf.mask() as usize;
        if t == 0 || m as usize * t >= n_bits {
            return invalid_property_error("bch: correction capability out of range");
        }

        let generator = Self::build_generator(&gf, t);
        let ecc_bits = poly_degree(&generator).unwrap_or(0);
        let ecc_bytes = ecc_bits.div_ceil(8);

        let mut gen_low = generator;
        gen_low[ecc_bits / 64] &= !(1u64 << (ecc_bits % 64));
        gen_low.truncate(words_for(ecc_bits).max(1));

        let mut code = BchCode {
            gf,
            t,
            n_bits,
            ecc_bits,
            ecc_bytes,
            gen_low,
            rem_tab: Vec::new(),
            xi_tab: Vec::new(),
        };
        code.build_rem_tab();
        code.build_xi_tab();
        Ok(code)
    }

    /// LCM of the minimal polynomials of α, α^3, ..., α^(2t−1).
    fn build_generator(gf: &GaloisField, t: usize) -> Vec<u64> {
        let n = gf.mask() as usize;
        let mut covered = vec![false; n + 1];

        let mut generator = vec![0u64; 1];
        generator[0] = 1;

        for i in 0..t {
            let root = (2 * i + 1) % n;
            if covered[root] {
                continue;
            }

            // Conjugacy class of the root; the minimal polynomial has one linear factor per
            // member and ends up with coefficients in GF(2).
            let mut minimal = vec![1u32];
            let mut e = root;
            loop {
                covered[e] = true;
                minimal = gf.mul_poly(&[gf.exp(e as u32), 1], &minimal);
                e = e * 2 % n;
                if e == root {
                    break;
                }
            }

            let mut mask = 0u64;
            for (k, &c) in minimal.iter().enumerate() {
                if c != 0 {
                    mask |= 1 << k;
                }
            }

            let deg_g = poly_degree(&generator).unwrap_or(0);
            let mut product = vec![0u64; words_for(deg_g + minimal.len())];
            let mut shift = mask;
            while shift != 0 {
                let s = shift.trailing_zeros() as usize;
                xor_shifted(&mut product, &generator, s);
                shift &= shift - 1;
            }
            generator = product;
        }

        generator
    }

    /// Remainder of one LFSR step over the generator.
    fn step_bit(&self, reg: &mut [u64], bit: bool) {
        let carry = get_bit(reg, self.ecc_bits - 1);

        // Shift the register up one, bounded to the generator degree.
        for i in (1..reg.len()).rev() {
            reg[i] = reg[i] << 1 | reg[i - 1] >> 63;
        }
        reg[0] <<= 1;
        if self.ecc_bits % 64 != 0 {
            let last = reg.len() - 1;
            reg[last] &= (1u64 << (self.ecc_bits % 64)) - 1;
        }

        if carry ^ bit {
            for (r, &g) in reg.iter_mut().zip(self.gen_low.iter()) {
                *r ^= g;
            }
        }
    }

    fn build_rem_tab(&mut self) {
        if self.ecc_bits < 8 {
            return;
        }
        let words = words_for(self.ecc_bits);
        let mut tab = Vec::with_capacity(256);
        for b in 0u16..256 {
            let mut reg = vec![0u64; words];
            for j in (0..8).rev() {
                self.step_bit(&mut reg, b >> j & 1 != 0);
            }
            tab.push(reg);
        }
        self.rem_tab = tab;
    }

    fn solve_quadratic_basis(&self, target: u32) -> Option<u32> {
        for y in 0..self.gf.alphabet_size() {
            if self.gf.mul(y, y) ^ y == target {
                return Some(y);
            }
        }
        None
    }

    // y² + y is GF(2)-linear, so solutions superpose over the bit basis. Basis elements of odd
    // trace have no solution of their own; they are solved against a fixed odd-trace reference
    // element, whose contributions cancel whenever the right-hand side has even trace.
    fn build_xi_tab(&mut self) {
        let m = self.gf.degree() as usize;

        let odd: Vec<bool> =
            (0..m).map(|k| self.solve_quadratic_basis(1 << k).is_none()).collect();
        let reference = odd.iter().position(|&o| o).map(|k| 1u32 << k).unwrap_or(0);

        let mut tab = Vec::with_capacity(m);
        for k in 0..m {
            let target = if odd[k] { 1 << k ^ reference } else { 1 << k };
            let y = self.solve_quadratic_basis(target).unwrap_or(0);
            tab.push((odd[k], y));
        }
        self.xi_tab = tab;
    }

    /// One byte-wide reduction step.
    fn step_byte(&self, reg: &mut [u64], byte: u8) {
        if self.ecc_bits < 8 {
            for j in (0..8).rev() {
                self.step_bit(reg, byte >> j & 1 != 0);
            }
            return;
        }

        // Extract the top 8 bits, shift up by a byte, then fold in the table entry.
        let top_at = self.ecc_bits - 8;
        let (word, bit) = (top_at / 64, top_at % 64);
        let mut top = reg[word] >> bit;
        if bit > 56 && word + 1 < reg.len() {
            top |= reg[word + 1] << (64 - bit);
        }
        let index = (top as u8) ^ byte;

        for i in (1..reg.len()).rev() {
            reg[i] = reg[i] << 8 | reg[i - 1] >> 56;
        }
        reg[0] <<= 8;
        if self.ecc_bits % 64 != 0 {
            let last = reg.len() - 1;
            reg[last] &= (1u64 << (self.ecc_bits % 64)) - 1;
        }

        for (r, &t) in reg.iter_mut().zip(self.rem_tab[index as usize].iter()) {
            *r ^= t;
        }
    }

    /// Compute the ECC bytes of a data block. The parity bits live in the top of the byte
    /// stream, MSB first, with zero padding in the trailing byte when the generator degree is
    /// not a byte multiple.
    fn compute_ecc(&self, data: &[u8], ecc: &mut [u8]) {
        let mut reg = vec![0u64; words_for(self.ecc_bits).max(1)];
        for &byte in data {
            self.step_byte(&mut reg, byte);
        }

        for (k, out) in ecc.iter_mut().enumerate() {
            let mut byte = 0u8;
            for j in 0..8 {
                let pos = 8 * k + j;
                if pos < self.ecc_bits {
                    let q = self.ecc_bits - 1 - pos;
                    if get_bit(&reg, q) {
                        byte |= 0x80 >> j;
                    }
                }
            }
            *out = byte;
        }
    }

    /// Syndromes S_1..S_2t evaluated from the difference between the received and the
    /// recomputed ECC. The data contribution cancels in the difference, which is exactly the
    /// error polynomial reduced by the generator.
    fn syndromes(&self, diff: &[u8]) -> Vec<u32> {
        let n = self.n_bits as u64;
        let mut syn = vec![0u32; 2 * self.t];

        for (k, &byte) in diff.iter().enumerate() {
            if byte == 0 {
                continue;
            }
            for j in 0..8 {
                if byte & (0x80 >> j) == 0 {
                    continue;
                }
                let pos = 8 * k + j;
                if pos >= self.ecc_bits {
                    continue;
                }
                let q = (self.ecc_bits - 1 - pos) as u64;
                for (i, s) in syn.iter_mut().enumerate() {
                    let power = (q * (i as u64 + 1) % n) as u32;
                    *s ^= self.gf.exp(power);
                }
            }
        }
        syn
    }

    /// Berlekamp-Massey over 2t syndromes. Returns the error-locator polynomial coefficients,
    /// constant term first.
    fn berlekamp_massey(&self, syn: &[u32]) -> Vec<u32> {
        let gf = &self.gf;
        let two_t = 2 * self.t;

        let mut sigma = vec![0u32; two_t + 1];
        let mut prev = vec![0u32; two_t + 1];
        sigma[0] = 1;
        prev[0] = 1;

        let mut l = 0usize;
        let mut shift = 1usize;
        let mut last_d = 1u32;

        for n in 0..two_t {
            let mut d = syn[n];
            for i in 1..=l.min(n) {
                d ^= gf.mul(sigma[i], syn[n - i]);
            }

            if d == 0 {
                shift += 1;
            }
            else {
                let coef = gf.mul(d, gf.inv(last_d));
                if 2 * l <= n {
                    let saved = sigma.clone();
                    for i in shift..sigma.len() {
                        sigma[i] ^= gf.mul(coef, prev[i - shift]);
                    }
                    l = n + 1 - l;
                    prev = saved;
                    last_d = d;
                    shift = 1;
                }
                else {
                    for i in shift..sigma.len() {
                        sigma[i] ^= gf.mul(coef, prev[i - shift]);
                    }
                    shift += 1;
                }
            }
        }

        sigma.truncate(l + 1);
        sigma
    }

    /// Evaluate the locator at a field element.
    fn eval(&self, sigma: &[u32], x: u32) -> u32 {
        let mut acc = 0u32;
        let mut power = 1u32;
        for &c in sigma.iter() {
            acc ^= self.gf.mul(c, power);
            power = self.gf.mul(power, x);
        }
        acc
    }

    /// Find the error locations (codeword bit exponents) of the locator polynomial. Returns
    /// `None` when the roots do not all exist in the field.
    fn find_error_locations(&self, sigma: &[u32]) -> Option<Vec<usize>> {
        let gf = &self.gf;
        let n = self.n_bits;
        let deg = sigma.iter().rposition(|&c| c != 0)?;
        if deg == 0 {
            return None;
        }

        if deg == 1 {
            // σ1·x + 1 = 0.
            let root = gf.inv(sigma[1]);
            return Some(vec![(n - gf.log(root) as usize) % n]);
        }

        if deg == 2 {
            // Normalise to x² + a·x + c and substitute x = a·y to reach y² + y = c·a^-2,
            // solved over the linearised basis.
            let a = gf.mul(sigma[1], gf.inv(sigma[2]));
            let c = gf.inv(sigma[2]);
            if a == 0 {
                return None;
            }
            let rhs = gf.mul(c, gf.inv(gf.mul(a, a)));

            let mut y = 0u32;
            let mut odd_bits = 0usize;
            let mut bits = rhs;
            while bits != 0 {
                let k = bits.trailing_zeros() as usize;
                let (odd, solution) = self.xi_tab[k];
                if odd {
                    odd_bits += 1;
                }
                y ^= solution;
                bits &= bits - 1;
            }
            // Odd overall trace means no root lies in the field.
            if odd_bits % 2 != 0 {
                return None;
            }

            let r1 = gf.mul(a, y);
            let r2 = r1 ^ a;
            if r1 == 0 || r2 == 0 || self.eval(sigma, r1) != 0 {
                return None;
            }
            return Some(vec![
                (n - gf.log(r1) as usize) % n,
                (n - gf.log(r2) as usize) % n,
            ]);
        }

        // Chien search: walk every non-zero field element, stepping each register by its
        // coefficient power.
        let mut reg: Vec<u32> = sigma[..=deg].to_vec();
        let steps: Vec<u32> = (0..=deg).map(|k| gf.exp((k % n) as u32)).collect();
        let mut locations = Vec::with_capacity(deg);

        for i in 1..=n {
            let mut sum = 0u32;
            for (r, &step) in reg.iter_mut().zip(steps.iter()) {
                *r = gf.mul(*r, step);
                sum ^= *r;
            }
            if sum == 0 {
                if locations.len() == deg {
                    return None;
                }
                locations.push((n - i) % n);
            }
        }

        if locations.len() == deg {
            Some(locations)
        }
        else {
            None
        }
    }

    /// Decode one block in place: `data` followed by its ECC bytes.
    fn decode_block(&self, data: &mut [u8], ecc: &mut [u8]) -> BlockDecode {
        let mut calc = vec![0u8; self.ecc_bytes];
        self.compute_ecc(data, &mut calc);

        for (c, &r) in calc.iter_mut().zip(ecc.iter()) {
            *c ^= r;
        }
        if calc.iter().all(|&b| b == 0) {
            return BlockDecode::Clean;
        }

        let syn = self.syndromes(&calc);
        let sigma = self.berlekamp_massey(&syn);
        if sigma.len() - 1 > self.t {
            return BlockDecode::Uncorrectable;
        }

        let Some(locations) = self.find_error_locations(&sigma) else {
            return BlockDecode::Uncorrectable;
        };

        let data_bits = 8 * data.len();
        let total_bits = data_bits + self.ecc_bits;
        if locations.iter().any(|&q| q >= total_bits) {
            return BlockDecode::Uncorrectable;
        }

        for &q in locations.iter() {
            if q >= self.ecc_bits {
                let pos = data_bits - 1 - (q - self.ecc_bits);
                data[pos / 8] ^= 0x80 >> (pos % 8);
            }
            else {
                let pos = self.ecc_bits - 1 - q;
                ecc[pos / 8] ^= 0x80 >> (pos % 8);
            }
        }

        BlockDecode::Corrected(locations.len() as u32)
    }
}

/// The BCH pipeline stage. `byteParityNumber` carries the bit-correction capability t; the
/// parity byte count per block follows from the generator degree.
pub struct BchCodec {
    spec: CodecSpec,
    bch: BchCode,
    message_size: usize,
}

impl BchCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let Some(t) = properties.usize_value(keys::PARITY_SIZE) else {
            return missing_property_error(keys::PARITY_SIZE);
        };
        let mut polynom = properties.u32_value(keys::POLYNOM).unwrap_or(DEFAULT_POLYNOM);
        if polynom == 0 {
            polynom = DEFAULT_POLYNOM;
        }
        if polynom < 1 << 5 {
            return invalid_property_error("bch: polynom selects a field below order 5");
        }
        // A bare field order may be configured instead of a full polynomial.
        if polynom.is_power_of_two() {
            let m = polynom.trailing_zeros() as usize;
            if m < 5 || m > 15 {
                return invalid_property_error("bch: field order must be in 5..=15");
            }
            polynom = PRIM_POLY[m - 5];
        }

        let bch = BchCode::new(t, polynom)?;

        let full_block = bch.n_bits / 8;
        let message_size = match properties.usize_value(keys::MESSAGE_SIZE) {
            Some(size) => size,
            None => full_block - bch.ecc_bytes,
        };
        if message_size == 0 || 8 * (message_size + bch.ecc_bytes) > bch.n_bits + 7 {
            return invalid_property_error("bch: block exceeds the field codeword bound");
        }

        let spec = CodecSpec {
            flags: CodecFlags::ERROR_CORRECTING | CodecFlags::PRE_ZERO_PAD | CodecFlags::REENTRANT,
            decoded_block_size: message_size,
            encoded_block_size: message_size + bch.ecc_bytes,
            decoded_symbol_size: 1,
            encoded_symbol_size: 1,
            ..Default::default()
        };

        Ok(BchCodec { spec, bch, message_size })
    }

    /// The exact generator degree in bits.
    pub fn ecc_bits(&self) -> usize {
        self.bch.ecc_bits
    }

    pub fn ecc_bytes(&self) -> usize {
        self.bch.ecc_bytes
    }
}

impl Codec for BchCodec {
    fn name(&self) -> &'static str {
        "BCH"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        if buf.len_bytes() % self.message_size != 0 {
            return misaligned_error("bch: input is not block aligned");
        }

        let blocks = buf.len_bytes() / self.message_size;
        let block_out = self.spec.encoded_block_size;
        let mut out = vec![0u8; blocks * block_out];

        for block in 0..blocks {
            let data = &buf.as_slice()[block * self.message_size..(block + 1) * self.message_size];
            let base = block * block_out;
            out[base..base + self.message_size].copy_from_slice(data);
            let (data_out, ecc_out) =
                out[base..base + block_out].split_at_mut(self.message_size);
            self.bch.compute_ecc(data_out, ecc_out);
        }

        buf.replace(out, 1);
        Ok(())
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        stats: &mut DecodeStats,
    ) -> Result<()> {
        let block_in = self.spec.encoded_block_size;
        if buf.len_bytes() % block_in != 0 {
            return misaligned_error("bch: input is not block aligned");
        }

        let blocks = buf.len_bytes() / block_in;
        let mut out = vec![0u8; blocks * self.message_size];

        let mut resolved = 0u32;
        let mut failed_blocks = 0u32;

        for block in 0..blocks {
            let frame = &mut buf.as_slice_mut()[block * block_in..(block + 1) * block_in];
            let (data, ecc) = frame.split_at_mut(self.message_size);

            match self.bch.decode_block(data, ecc) {
                BlockDecode::Clean => (),
                BlockDecode::Corrected(bits) => resolved += bits,
                BlockDecode::Uncorrectable => failed_blocks += 1,
            }

            out[block * self.message_size..(block + 1) * self.message_size].copy_from_slice(data);
        }

        if failed_blocks > 0 {
            warn!("bch: {} uncorrectable blocks", failed_blocks);
        }
        else if resolved > 0 {
            debug!("bch: corrected {} bits", resolved);
        }

        stats.resolved_errors += resolved;
        stats.unresolved_errors += failed_blocks;
        stats.fec_accumulated_amount += resolved as f32;
        stats.fec_accumulated_weight += (blocks * self.bch.t) as f32;

        buf.replace(out, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use reelcode_core::config::Config;

    fn codec(message: usize, t: usize, polynom: u32) -> BchCodec {
        let mut properties = Properties::new();
        properties.insert(keys::MESSAGE_SIZE, message);
        properties.insert(keys::PARITY_SIZE, t);
        properties.insert(keys::POLYNOM, polynom);
        BchCodec::try_new(&properties, &Config::new()).unwrap()
    }

    #[test]
    fn verify_generator_degree_gf256() {
        // BCH(255, 239, t=2) has the classic 16-bit generator.
        let bch = codec(16, 2, 0x11d);
        assert_eq!(bch.ecc_bits(), 16);
        assert_eq!(bch.ecc_bytes(), 2);
    }

    #[test]
    fn verify_clean_round_trip() {
        let mut bch = codec(16, 2, 0x11d);
        let payload: Vec<u8> = (0..32).map(|i| i as u8 ^ 0x5a).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        bch.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 2 * 18);

        let mut stats = DecodeStats::new();
        bch.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.resolved_errors, 0);
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn verify_corrects_scattered_bits() {
        let mut bch = codec(16, 2, 0x11d);
        let payload: Vec<u8> = (0..16).map(|i| i as u8).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        bch.encode(&mut buf).unwrap();

        // Two bit errors, one in the data and one in the parity.
        buf.as_slice_mut()[3] ^= 0x08;
        buf.as_slice_mut()[17] ^= 0x01;

        let mut stats = DecodeStats::new();
        bch.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.resolved_errors, 2);
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn verify_single_bit_uses_closed_form() {
        let mut bch = codec(16, 2, 0x11d);
        let payload: Vec<u8> = (0..16).map(|i| (i as u8).wrapping_mul(3)).collect();

        for bit in [0usize, 7, 63, 127] {
            let mut buf = DataBuffer::from_bytes(payload.clone());
            bch.encode(&mut buf).unwrap();
            buf.as_slice_mut()[bit / 8] ^= 0x80 >> (bit % 8);

            let mut stats = DecodeStats::new();
            bch.decode(&mut buf, &[], &mut stats).unwrap();
            assert_eq!(buf.as_slice(), &payload[..], "bit {}", bit);
            assert_eq!(stats.resolved_errors, 1);
        }
    }

    #[test]
    fn verify_overload_is_flagged_not_fabricated() {
        let mut bch = codec(16, 2, 0x11d);
        let payload: Vec<u8> = (0..16).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        bch.encode(&mut buf).unwrap();

        // Five bit errors against t = 2.
        for bit in [1usize, 17, 40, 77, 99] {
            buf.as_slice_mut()[bit / 8] ^= 0x80 >> (bit % 8);
        }
        let received = buf.clone();

        let mut stats = DecodeStats::new();
        bch.decode(&mut buf, &[], &mut stats).unwrap();

        if stats.unresolved_errors > 0 {
            // The block was left as received.
            assert_eq!(buf.as_slice(), &received.as_slice()[..16]);
        }
    }

    #[test]
    fn verify_dense_byte_errors_at_full_capability() {
        // The archival configuration: GF(2^14), t = 58.
        let mut bch = codec(256, 58, 0x402b);
        let t_bits: usize = 58;

        let payload: Vec<u8> = (0..256).map(|i| i as u8).collect();
        let mut buf = DataBuffer::from_bytes(payload.clone());
        bch.encode(&mut buf).unwrap();

        // 7 whole bytes and two extra bits: exactly t errors.
        for i in 0..7 {
            buf.as_slice_mut()[i] ^= 0xff;
        }
        buf.as_slice_mut()[7] ^= 0x03;

        let mut stats = DecodeStats::new();
        bch.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.resolved_errors, t_bits as u32);
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn verify_random_noise_within_capability() {
        let mut bch = codec(64, 6, 0x201b);
        let payload: Vec<u8> = (0..64).map(|i| (i as u8).wrapping_mul(11)).collect();

        let mut rng = SmallRng::seed_from_u64(0xbc4);
        for trial in 0..8 {
            let mut buf = DataBuffer::from_bytes(payload.clone());
            bch.encode(&mut buf).unwrap();
            let total_bits = 8 * buf.len_bytes();

            for _ in 0..6 {
                let bit = rng.random_range(0..total_bits);
                buf.as_slice_mut()[bit / 8] ^= 0x80 >> (bit % 8);
            }

            let mut stats = DecodeStats::new();
            bch.decode(&mut buf, &[], &mut stats).unwrap();
            assert_eq!(buf.as_slice(), &payload[..], "trial {}", trial);
            assert_eq!(stats.unresolved_errors, 0);
        }
    }
}

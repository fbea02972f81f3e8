// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Low-density parity-check coding.
//!
//! The code is systematic: the parity-check matrix is H = [A | I], with A a seeded sparse
//! matrix of fixed column weight over the message bits, so the generator is the same A and
//! encoding is a sparse GF(2) product. Decoding runs normalised min-sum belief propagation
//! over the Tanner graph for a configured iteration budget and reports the number of parity
//! checks left unsatisfied.

use log::{debug, warn};

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecFlags, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{
    invalid_property_error, misaligned_error, missing_property_error, Result,
};
use reelcode_core::stats::DecodeStats;

const DEFAULT_SEED: u32 = 0x1db7;
const DEFAULT_ITERATIONS: usize = 32;
const COLUMN_WEIGHT: usize = 3;

/// Channel log-likelihood magnitude assigned to hard-decision input bits.
const CHANNEL_LLR: f32 = 2.0;
/// Min-sum attenuation.
const NORMALISATION: f32 = 0.75;

fn xorshift32(state: &mut u32) -> u32 {
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    *state
}

/// The Tanner graph of the code. Check r connects its message-bit neighbours plus parity
/// variable k + r.
struct LdpcGraph {
    k_bits: usize,
    p_bits: usize,
    /// Variable indices per check, the parity variable last.
    checks: Vec<Vec<u32>>,
}

impl LdpcGraph {
    fn new(k_bits: usize, p_bits: usize, seed: u32) -> LdpcGraph {
        let mut state = if seed == 0 { DEFAULT_SEED } else { seed };
        let weight = COLUMN_WEIGHT.min(p_bits);

        let mut checks: Vec<Vec<u32>> = vec![Vec::new(); p_bits];
        for col in 0..k_bits as u32 {
            let mut rows = [usize::MAX; COLUMN_WEIGHT];
            for slot in 0..weight {
                loop {
                    let row = xorshift32(&mut state) as usize % p_bits;
                    if !rows[..slot].contains(&row) {
                        rows[slot] = row;
                        checks[row].push(col);
                        break;
                    }
                }
            }
        }

        for (r, check) in checks.iter_mut().enumerate() {
            check.push((k_bits + r) as u32);
        }

        LdpcGraph { k_bits, p_bits, checks }
    }

    /// Parity bits of a message bit-vector: p = A·d over GF(2).
    fn parity(&self, bits: &[u8]) -> Vec<u8> {
        let mut parity = vec![0u8; self.p_bits];
        for (r, check) in self.checks.iter().enumerate() {
            let mut acc = 0u8;
            for &v in &check[..check.len() - 1] {
                acc ^= bits[v as usize];
            }
            parity[r] = acc;
        }
        parity
    }

    /// Min-sum belief propagation over hard-decision input bits. Returns the corrected bit
    /// vector and the number of parity checks still unsatisfied.
    fn propagate(&self, bits: &mut [u8], iterations: usize) -> usize {
        let llr: Vec<f32> =
            bits.iter().map(|&b| if b == 0 { CHANNEL_LLR } else { -CHANNEL_LLR }).collect();

        let mut c2v: Vec<Vec<f32>> =
            self.checks.iter().map(|check| vec![0.0; check.len()]).collect();
        let mut total = llr.clone();

        for _ in 0..=iterations {
            if self.unsatisfied(&total) == 0 {
                break;
            }

            // Check node update: sign product and two smallest magnitudes of the incoming
            // variable messages, excluding the target edge.
            for (r, check) in self.checks.iter().enumerate() {
                let mut sign = 1.0f32;
                let mut min1 = f32::MAX;
                let mut min2 = f32::MAX;
                let mut min_at = 0usize;

                for (pos, &v) in check.iter().enumerate() {
                    let incoming = total[v as usize] - c2v[r][pos];
                    if incoming < 0.0 {
                        sign = -sign;
                    }
                    let mag = incoming.abs();
                    if mag < min1 {
                        min2 = min1;
                        min1 = mag;
                        min_at = pos;
                    }
                    else if mag < min2 {
                        min2 = mag;
                    }
                }

                for (pos, &v) in check.iter().enumerate() {
                    let incoming = total[v as usize] - c2v[r][pos];
                    let mag = if pos == min_at { min2 } else { min1 };
                    let self_sign = if incoming < 0.0 { -1.0 } else { 1.0 };
                    let updated = NORMALISATION * sign * self_sign * mag;

                    total[v as usize] += updated - c2v[r][pos];
                    c2v[r][pos] = updated;
                }
            }
        }

        for (b, &t) in bits.iter_mut().zip(total.iter()) {
            *b = if t < 0.0 { 1 } else { 0 };
        }
        self.unsatisfied(&total)
    }

    fn unsatisfied(&self, total: &[f32]) -> usize {
        self.checks
            .iter()
            .filter(|check| {
                check.iter().filter(|&&v| total[v as usize] < 0.0).count() % 2 != 0
            })
            .count()
    }
}

fn bytes_to_bits(bytes: &[u8], bits: &mut [u8]) {
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = bytes[i / 8] >> (7 - i % 8) & 1;
    }
}

fn bits_to_bytes(bits: &[u8], bytes: &mut [u8]) {
    for byte in bytes.iter_mut() {
        *byte = 0;
    }
    for (i, &bit) in bits.iter().enumerate() {
        bytes[i / 8] |= bit << (7 - i % 8);
    }
}

/// The LDPC pipeline stage. Blocks of `messageSize` bytes gain `byteParityNumber` parity
/// bytes; the sparse matrix is derived from the `seed` property.
pub struct LdpcCodec {
    spec: CodecSpec,
    graph: LdpcGraph,
    message_size: usize,
    iterations: usize,
}

impl LdpcCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let Some(message_size) = properties.usize_value(keys::MESSAGE_SIZE) else {
            return missing_property_error(keys::MESSAGE_SIZE);
        };
        let Some(parity_size) = properties.usize_value(keys::PARITY_SIZE) else {
            return missing_property_error(keys::PARITY_SIZE);
        };
        if message_size == 0 || parity_size == 0 {
            return invalid_property_error("ldpc: block geometry must be non-zero");
        }

        let seed = properties.u32_value(keys::SEED).unwrap_or(DEFAULT_SEED);
        let iterations =
            properties.usize_value(keys::ITERATIONS).unwrap_or(DEFAULT_ITERATIONS);

        let graph = LdpcGraph::new(8 * message_size, 8 * parity_size, seed);

        let spec = CodecSpec {
            flags: CodecFlags::ERROR_CORRECTING | CodecFlags::PRE_ZERO_PAD | CodecFlags::REENTRANT,
            decoded_block_size: message_size,
            encoded_block_size: message_size + parity_size,
            decoded_symbol_size: 1,
            encoded_symbol_size: 1,
            ..Default::default()
        };

        Ok(LdpcCodec { spec, graph, message_size, iterations })
    }
}

impl Codec for LdpcCodec {
    fn name(&self) -> &'static str {
        "LDPC"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        if buf.len_bytes() % self.message_size != 0 {
            return misaligned_error("ldpc: input is not block aligned");
        }

        let blocks = buf.len_bytes() / self.message_size;
        let block_out = self.spec.encoded_block_size;
        let mut out = vec![0u8; blocks * block_out];
        let mut bits = vec![0u8; self.graph.k_bits];

        for block in 0..blocks {
            let data = &buf.as_slice()[block * self.message_size..(block + 1) * self.message_size];
            bytes_to_bits(data, &mut bits);
            let parity = self.graph.parity(&bits);

            let base = block * block_out;
            out[base..base + self.message_size].copy_from_slice(data);
            bits_to_bytes(&parity, &mut out[base + self.message_size..base + block_out]);
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
            return misaligned_error("ldpc: input is not block aligned");
        }

        let blocks = buf.len_bytes() / block_in;
        let mut out = vec![0u8; blocks * self.message_size];
        let mut bits = vec![0u8; self.graph.k_bits + self.graph.p_bits];

        let mut resolved = 0u32;
        let mut residual = 0u32;

        for block in 0..blocks {
            let frame = &buf.as_slice()[block * block_in..(block + 1) * block_in];
            bytes_to_bits(frame, &mut bits);
            let received = bits.clone();

            let unsatisfied = self.graph.propagate(&mut bits, self.iterations);
            residual += unsatisfied as u32;
            resolved +=
                bits.iter().zip(received.iter()).filter(|(a, b)| a != b).count() as u32;

            bits_to_bytes(
                &bits[..self.graph.k_bits],
                &mut out[block * self.message_size..(block + 1) * self.message_size],
            );
        }

        if residual > 0 {
            warn!("ldpc: {} parity checks left unsatisfied", residual);
        }
        else if resolved > 0 {
            debug!("ldpc: flipped {} bits", resolved);
        }

        stats.resolved_errors += resolved;
        stats.unresolved_errors += residual;
        stats.fec_accumulated_amount += resolved as f32;
        stats.fec_accumulated_weight += (blocks * self.graph.p_bits) as f32;

        buf.replace(out, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::Config;

    fn codec(message: usize, parity: usize) -> LdpcCodec {
        let mut properties = Properties::new();
        properties.insert(keys::MESSAGE_SIZE, message);
        properties.insert(keys::PARITY_SIZE, parity);
        properties.insert(keys::SEED, 0xace1u32);
        LdpcCodec::try_new(&properties, &Config::new()).unwrap()
    }

    #[test]
    fn verify_clean_round_trip() {
        let mut ldpc = codec(8, 4);
        let payload: Vec<u8> = (0..16).map(|i| i as u8 ^ 0xc3).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        ldpc.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 24);

        let mut stats = DecodeStats::new();
        ldpc.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.resolved_errors, 0);
        assert_eq!(stats.unresolved_errors, 0);
    }

    #[test]
    fn verify_codewords_satisfy_all_checks() {
        let ldpc = codec(8, 4);
        let mut bits = vec![0u8; 64];
        bytes_to_bits(&[0x13, 0x57, 0x9b, 0xdf, 0x02, 0x46, 0x8a, 0xce], &mut bits);

        let parity = ldpc.graph.parity(&bits);
        let mut all = bits.clone();
        all.extend_from_slice(&parity);

        for check in ldpc.graph.checks.iter() {
            let sum: u8 = check.iter().map(|&v| all[v as usize]).fold(0, |a, b| a ^ b);
            assert_eq!(sum, 0);
        }
    }

    #[test]
    fn verify_corrects_single_message_bit() {
        let mut ldpc = codec(8, 4);
        let payload: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x23, 0x45, 0x67];

        let mut buf = DataBuffer::from_bytes(payload.clone());
        ldpc.encode(&mut buf).unwrap();

        // One hard error in the message region.
        buf.as_slice_mut()[2] ^= 0x10;

        let mut stats = DecodeStats::new();
        ldpc.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
        assert_eq!(stats.unresolved_errors, 0);
        assert!(stats.resolved_errors >= 1);
    }

    #[test]
    fn verify_misaligned_input_is_rejected() {
        let mut ldpc = codec(8, 4);
        let mut buf = DataBuffer::from_bytes(vec![0; 13]);
        assert!(ldpc.encode(&mut buf).is_err());

        let mut stats = DecodeStats::new();
        let mut buf = DataBuffer::from_bytes(vec![0; 23]);
        assert!(ldpc.decode(&mut buf, &[], &mut stats).is_err());
    }
}

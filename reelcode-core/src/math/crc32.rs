// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 32-bit cyclic redundancy check with a configurable polynomial and seed.

/// CRC-32 (IEEE 802.3) generator polynomial.
pub const POLY_CRC_32: u32 = 0x04C11DB7;
/// CRC-32C (Castagnoli) generator polynomial.
pub const POLY_CRC_32C: u32 = 0x1EDC6F41;
/// CRC-32K (Koopman) generator polynomial.
pub const POLY_CRC_32K: u32 = 0x741B8CD7;
/// CRC-32Q generator polynomial.
pub const POLY_CRC_32Q: u32 = 0x814141AB;

const DEFAULT_SEED: u32 = 0xffff_ffff;
const FINAL_XOR: u32 = 0xffff_ffff;

/// Table-driven reflected CRC-32. The polynomial is given in its conventional MSB-first form
/// and reflected internally, so the default parameters produce the standard check value
/// `0xCBF43926` over `"123456789"`.
pub struct Crc32 {
    table: [u32; 256],
    seed: u32,
    state: u32,
}

impl Crc32 {
    /// Instantiate with an explicit seed and polynomial.
    pub fn new(seed: u32, poly: u32) -> Crc32 {
        let poly = poly.reverse_bits();

        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut r = i as u32;
            for _ in 0..8 {
                r = if r & 1 != 0 { (r >> 1) ^ poly } else { r >> 1 };
            }
            *entry = r;
        }

        Crc32 { table, seed, state: seed }
    }

    /// Instantiate with the standard polynomial and seed.
    pub fn default_crc() -> Crc32 {
        Crc32::new(DEFAULT_SEED, POLY_CRC_32)
    }

    /// Restart the running checksum from the given seed.
    pub fn reset(&mut self, seed: u32) {
        self.state = seed;
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Feed bytes into the running checksum.
    pub fn update(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.state = self.table[((self.state ^ u32::from(byte)) & 0xff) as usize]
                ^ (self.state >> 8);
        }
    }

    /// The checksum of everything fed since the last reset.
    pub fn crc(&self) -> u32 {
        self.state ^ FINAL_XOR
    }

    /// One-shot checksum of a buffer using the configured seed.
    pub fn calc(&mut self, buf: &[u8]) -> u32 {
        self.reset(self.seed);
        self.update(buf);
        self.crc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_standard_check_value() {
        let mut crc = Crc32::default_crc();
        assert_eq!(crc.calc(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn verify_incremental_matches_one_shot() {
        let mut crc = Crc32::default_crc();
        let whole = crc.calc(b"The quick brown fox jumps over the lazy dog");

        crc.reset(0xffff_ffff);
        crc.update(b"The quick brown fox ");
        crc.update(b"jumps over the lazy dog");
        assert_eq!(crc.crc(), whole);
    }

    #[test]
    fn verify_castagnoli_check_value() {
        let mut crc = Crc32::new(0xffff_ffff, POLY_CRC_32C);
        assert_eq!(crc.calc(b"123456789"), 0xE3069283);
    }
}

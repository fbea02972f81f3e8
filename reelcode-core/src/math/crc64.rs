// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 64-bit cyclic redundancy check with a configurable polynomial and seed.

/// CRC-64 (ECMA-182) generator polynomial.
pub const POLY_CRC_64: u64 = 0x42F0E1EBA9EA3693;

const DEFAULT_SEED: u64 = 0xffff_ffff_ffff_ffff;
const FINAL_XOR: u64 = 0xffff_ffff_ffff_ffff;

/// Table-driven reflected CRC-64 over the ECMA-182 polynomial (the XZ parameterisation). The
/// polynomial is given in its conventional MSB-first form and reflected internally.
pub struct Crc64 {
    table: [u64; 256],
    seed: u64,
    state: u64,
}

impl Crc64 {
    /// Instantiate with an explicit seed and polynomial.
    pub fn new(seed: u64, poly: u64) -> Crc64 {
        let poly = poly.reverse_bits();

        let mut table = [0u64; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut r = i as u64;
            for _ in 0..8 {
                r = if r & 1 != 0 { (r >> 1) ^ poly } else { r >> 1 };
            }
            *entry = r;
        }

        Crc64 { table, seed, state: seed }
    }

    /// Instantiate with the ECMA-182 polynomial and the all-ones seed.
    pub fn default_crc() -> Crc64 {
        Crc64::new(DEFAULT_SEED, POLY_CRC_64)
    }

    /// Restart the running checksum from the given seed.
    pub fn reset(&mut self, seed: u64) {
        self.state = seed;
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Feed bytes into the running checksum.
    pub fn update(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.state = self.table[((self.state ^ u64::from(byte)) & 0xff) as usize]
                ^ (self.state >> 8);
        }
    }

    /// The checksum of everything fed since the last reset.
    pub fn crc(&self) -> u64 {
        self.state ^ FINAL_XOR
    }

    /// One-shot checksum of a buffer using the configured seed.
    pub fn calc(&mut self, buf: &[u8]) -> u64 {
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
        let mut crc = Crc64::default_crc();
        assert_eq!(crc.calc(b"123456789"), 0x995DC9BBDF1939FA);
    }

    #[test]
    fn verify_single_bit_sensitivity() {
        let mut crc = Crc64::default_crc();
        let clean = crc.calc(b"123456789");

        let mut corrupted = *b"123456789";
        corrupted[4] ^= 0x10;
        assert_ne!(crc.calc(&corrupted), clean);
    }
}

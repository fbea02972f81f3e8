// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Galois field arithmetic over GF(2^m), table-driven.

use crate::errors::{Error, Result};

/// A finite field GF(2^m) defined by a primitive polynomial of degree m.
///
/// The exponent table holds two periods of the α powers so that sums of two logarithms can be
/// looked up without a modular reduction. The logarithm table uses `log[0] == 0` as a sentinel;
/// callers guard the zero element explicitly.
pub struct GaloisField {
    prim_poly: u32,
    alphabet_size: u32,
    mask: u32,
    degree: u32,
    exp: Vec<u32>,
    log: Vec<u32>,
}

impl GaloisField {
    /// Build the field tables for the given primitive polynomial. The field order is derived
    /// from the highest set bit of the polynomial.
    pub fn new(prim_poly: u32) -> Result<Self> {
        if prim_poly == 0 {
            return Err(Error::InvalidField);
        }

        let mut degree = 0;
        let mut poly = prim_poly >> 1;
        while poly != 0 {
            degree += 1;
            poly >>= 1;
        }

        let alphabet_size = 1u32 << degree;
        let mask = alphabet_size - 1;

        let mut exp = vec![0u32; 2 * alphabet_size as usize];
        let mut log = vec![0u32; alphabet_size as usize];

        let mut x = 1u32;
        for i in 0..mask {
            exp[i as usize] = x;
            log[x as usize] = i;

            x <<= 1;
            if x & alphabet_size != 0 {
                x ^= prim_poly;
            }
        }

        for i in mask as usize..2 * alphabet_size as usize {
            exp[i] = exp[i - mask as usize];
        }

        Ok(GaloisField { prim_poly, alphabet_size, mask, degree, exp, log })
    }

    /// The field order 2^m.
    pub fn alphabet_size(&self) -> u32 {
        self.alphabet_size
    }

    /// The number of non-zero elements, 2^m - 1.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// The degree m of the field polynomial.
    pub fn degree(&self) -> u32 {
        self.degree
    }

    pub fn prim_poly(&self) -> u32 {
        self.prim_poly
    }

    /// α^i, for i in [0, 2·(2^m − 1)).
    #[inline]
    pub fn exp(&self, i: u32) -> u32 {
        self.exp[i as usize]
    }

    /// log α of a non-zero element.
    #[inline]
    pub fn log(&self, a: u32) -> u32 {
        self.log[a as usize]
    }

    /// Field product of two elements.
    #[inline]
    pub fn mul(&self, a: u32, b: u32) -> u32 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[(self.log[a as usize] + self.log[b as usize]) as usize]
    }

    /// α^a · b, the root-evaluation step used by syndrome and Chien loops.
    #[inline]
    pub fn roots_sum(&self, a: u32, b: u32) -> u32 {
        if b == 0 || self.exp[a as usize] == 0 {
            return 0;
        }
        self.exp[(a + self.log[b as usize]) as usize]
    }

    /// Multiplicative inverse of a non-zero element.
    #[inline]
    pub fn inv(&self, a: u32) -> u32 {
        self.exp[(self.mask - self.log[a as usize]) as usize]
    }

    /// Product of two polynomials over the field, by convolution. The result has
    /// `p1.len() + p2.len() - 1` coefficients.
    pub fn mul_poly(&self, p1: &[u32], p2: &[u32]) -> Vec<u32> {
        let mut dst = vec![0u32; p1.len() + p2.len() - 1];
        for (i, &a) in p1.iter().enumerate() {
            for (j, &b) in p2.iter().enumerate() {
                dst[i + j] ^= self.mul(b, a);
            }
        }
        dst
    }
}

#[cfg(test)]
mod tests {
    use super::GaloisField;
    use crate::errors::Error;

    #[test]
    fn verify_gf256_tables() {
        let gf = GaloisField::new(0x11d).unwrap();

        assert_eq!(gf.degree(), 8);
        assert_eq!(gf.alphabet_size(), 256);
        assert_eq!(gf.mask(), 255);

        // Known powers of α over the 0x11d field.
        assert_eq!(gf.exp(0), 1);
        assert_eq!(gf.exp(1), 2);
        assert_eq!(gf.exp(8), 29);
        assert_eq!(gf.exp(255), 1);
        assert_eq!(gf.log(29), 8);

        // The upper half duplicates the first period.
        for i in 0..255 {
            assert_eq!(gf.exp(i), gf.exp(i + 255));
        }
    }

    #[test]
    fn verify_field_operators() {
        let gf = GaloisField::new(0x11d).unwrap();

        assert_eq!(gf.mul(0, 7), 0);
        assert_eq!(gf.mul(7, 0), 0);
        assert_eq!(gf.mul(1, 7), 7);

        for a in 1..256 {
            assert_eq!(gf.mul(a, gf.inv(a)), 1, "a * a^-1 != 1 for a = {}", a);
        }

        // roots_sum(a, b) is α^a · b.
        assert_eq!(gf.roots_sum(3, 1), gf.exp(3));
        assert_eq!(gf.roots_sum(3, 0), 0);
    }

    #[test]
    fn verify_poly_product() {
        let gf = GaloisField::new(0x11d).unwrap();

        // (x + 1)(x + 2) = x^2 + 3x + 2 over GF(2^8).
        let p = gf.mul_poly(&[1, 1], &[2, 1]);
        assert_eq!(p, vec![2, 3, 1]);
    }

    #[test]
    fn verify_zero_polynomial_is_rejected() {
        assert!(matches!(GaloisField::new(0), Err(Error::InvalidField)));
    }

    #[test]
    fn verify_field_laws_hold_over_random_elements() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let gf = GaloisField::new(0x409).unwrap();
        let mut rng = SmallRng::seed_from_u64(0x6f);

        for _ in 0..1000 {
            let a: u32 = rng.random_range(0..1024);
            let b: u32 = rng.random_range(0..1024);
            let c: u32 = rng.random_range(0..1024);

            assert_eq!(gf.mul(gf.mul(a, b), c), gf.mul(a, gf.mul(b, c)));
            assert_eq!(gf.mul(a, b ^ c), gf.mul(a, b) ^ gf.mul(a, c));
        }
    }
}

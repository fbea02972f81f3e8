// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The whitening stage: an invertible XOR keystream over the frame, keeping pathological
//! payloads from producing long constant runs on the carrier.
//!
//! With a `seed` property the key is fixed. Without one the stage runs in auto-key mode: the
//! key is synthesised per session from the population count of the payload so the whitened
//! stream approaches bit balance, and travels to the decoder inside the packet header.

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecSpec, SessionState};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{invariant_error, Result};
use reelcode_core::stats::DecodeStats;

/// Number of set bits per byte value.
const ONES: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() as u8;
        i += 1;
    }
    table
};

fn xorshift32(state: &mut u32) -> u32 {
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    *state
}

/// XOR the buffer against the keystream derived from `key`. Self-inverse; the stream restarts
/// on every frame so the stage stays reentrant.
fn apply_keystream(key: u32, data: &mut [u8]) {
    let mut state = if key == 0 { 0x9e37_79b9 } else { key };
    for chunk in data.chunks_mut(4) {
        let word = xorshift32(&mut state).to_le_bytes();
        for (byte, &k) in chunk.iter_mut().zip(word.iter()) {
            *byte ^= k;
        }
    }
}

pub struct CipherCodec {
    spec: CodecSpec,
    auto_key: bool,
    key: u32,
    session: Option<SessionState>,
}

impl CipherCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let (auto_key, key) = match properties.u32_value(keys::SEED) {
            Some(seed) => (false, seed),
            None => (true, 0),
        };

        Ok(CipherCodec { spec: Default::default(), auto_key, key, session: None })
    }

    /// Derive a whitening key from the payload statistics. The population count feeds a short
    /// mixing chain so payloads with skewed bit balance land on different streams.
    fn synthesise_key(data: &[u8]) -> u32 {
        let mut ones = 0u64;
        for &byte in data {
            ones += u64::from(ONES[byte as usize]);
        }

        let total = 8 * data.len() as u64;
        let mut state = (ones as u32).wrapping_mul(0x9e37_79b9) ^ (total as u32).rotate_left(16);
        if state == 0 {
            state = 0x9e37_79b9;
        }
        xorshift32(&mut state)
    }
}

impl Codec for CipherCodec {
    fn name(&self) -> &'static str {
        "Cipher"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    fn bind_session(&mut self, session: &SessionState) {
        self.session = Some(session.clone());
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        let key = if self.auto_key {
            let key = Self::synthesise_key(buf.as_slice());
            match self.session {
                Some(ref session) => session.set_cipher_key(key),
                None => return invariant_error("cipher: auto key requires a bound session"),
            }
            key
        }
        else {
            self.key
        };

        apply_keystream(key, buf.as_slice_mut());
        Ok(())
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        _stats: &mut DecodeStats,
    ) -> Result<()> {
        let key = if self.auto_key {
            match self.session.as_ref().and_then(|s| s.cipher_key()) {
                Some(key) => key,
                None => {
                    return invariant_error("cipher: no session key, header not yet decoded")
                }
            }
        }
        else {
            self.key
        };

        apply_keystream(key, buf.as_slice_mut());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::{Config, Properties};
    use reelcode_core::dispatcher::{SymbolAlignment, VERSION_1_0};

    fn fixed_cipher(seed: u32) -> CipherCodec {
        let mut properties = Properties::new();
        properties.insert(keys::SEED, seed);
        CipherCodec::try_new(&properties, &Config::new()).unwrap()
    }

    #[test]
    fn verify_fixed_key_round_trip() {
        let mut cipher = fixed_cipher(0x1234_5678);
        let payload: Vec<u8> = (0..100).collect();

        let mut buf = DataBuffer::from_bytes(payload.clone());
        cipher.encode(&mut buf).unwrap();
        assert_ne!(buf.as_slice(), &payload[..]);

        let mut stats = DecodeStats::new();
        cipher.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_auto_key_travels_through_session() {
        let session = SessionState::new("test", VERSION_1_0, 2, SymbolAlignment::Bit);

        let mut cipher = CipherCodec::try_new(&Properties::new(), &Config::new()).unwrap();
        cipher.bind_session(&session);

        // A heavily skewed payload.
        let payload = vec![0u8; 64];
        let mut buf = DataBuffer::from_bytes(payload.clone());
        cipher.encode(&mut buf).unwrap();
        assert!(session.cipher_key().is_some());
        assert_ne!(buf.as_slice(), &payload[..]);

        let mut stats = DecodeStats::new();
        cipher.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_auto_key_decode_requires_key() {
        let session = SessionState::new("test", VERSION_1_0, 2, SymbolAlignment::Bit);

        let mut cipher = CipherCodec::try_new(&Properties::new(), &Config::new()).unwrap();
        cipher.bind_session(&session);

        let mut buf = DataBuffer::from_bytes(vec![0; 16]);
        let mut stats = DecodeStats::new();
        assert!(cipher.decode(&mut buf, &[], &mut stats).is_err());
    }

    #[test]
    fn verify_whitening_improves_bit_balance() {
        let mut cipher = CipherCodec::try_new(&Properties::new(), &Config::new()).unwrap();
        let session = SessionState::new("test", VERSION_1_0, 2, SymbolAlignment::Bit);
        cipher.bind_session(&session);

        let mut buf = DataBuffer::from_bytes(vec![0u8; 1024]);
        cipher.encode(&mut buf).unwrap();

        let ones: u32 = buf.as_slice().iter().map(|&b| u32::from(ONES[b as usize])).sum();
        let total = 8 * 1024;
        // An all-zero frame whitens to roughly half ones.
        assert!(ones > total / 4 && ones < 3 * total / 4);
    }
}

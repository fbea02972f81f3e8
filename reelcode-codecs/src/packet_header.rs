// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-frame packet header: a fixed little-endian prefix naming the coding scheme and
//! dispatcher version, the modulation and symbol alignment, and the whitening key when the
//! cipher runs auto-keyed. Decode validates the scheme identity before any payload stage runs.

use log::warn;

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecSpec, SessionState};
use reelcode_core::config::{Config, Properties};
use reelcode_core::dispatcher::{SymbolAlignment, Version};
use reelcode_core::errors::{
    incompatible_header_error, invariant_error, misaligned_error, Result,
};
use reelcode_core::stats::DecodeStats;

const SCHEME_FIELD: usize = 16;
/// scheme[16] + major u16 + minor u16 + modulation u8 + alignment u8 + flags u8 + key u32.
pub const HEADER_SIZE: usize = SCHEME_FIELD + 2 + 2 + 1 + 1 + 1 + 4;

const FLAG_CIPHER_KEY: u8 = 0x01;

pub struct PacketHeaderCodec {
    spec: CodecSpec,
    session: Option<SessionState>,
}

impl PacketHeaderCodec {
    pub fn try_new(_properties: &Properties, _config: &Config) -> Result<Self> {
        Ok(PacketHeaderCodec { spec: Default::default(), session: None })
    }

    fn session(&self) -> Result<&SessionState> {
        match self.session {
            Some(ref session) => Ok(session),
            None => invariant_error("packet header: stage not bound to a session"),
        }
    }
}

impl Codec for PacketHeaderCodec {
    fn name(&self) -> &'static str {
        "PacketHeader"
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

    fn init_capacity(&mut self, size: usize) -> Result<()> {
        if size <= HEADER_SIZE {
            return misaligned_error("packet header: capacity below the header size");
        }
        let spec = self.spec_mut();
        spec.encoded_block_size = size;
        spec.encoded_data_size = size;
        spec.decoded_block_size = size - HEADER_SIZE;
        spec.decoded_data_size = size - HEADER_SIZE;
        Ok(())
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        let session = self.session()?;

        let mut header = [0u8; HEADER_SIZE];
        let scheme = session.scheme().as_bytes();
        let name_len = scheme.len().min(SCHEME_FIELD);
        header[..name_len].copy_from_slice(&scheme[..name_len]);

        let version = session.version();
        header[16..18].copy_from_slice(&version.major.to_le_bytes());
        header[18..20].copy_from_slice(&version.minor.to_le_bytes());
        header[20] = session.modulation() as u8;
        header[21] = session.alignment().to_tag();

        if let Some(key) = session.cipher_key() {
            header[22] = FLAG_CIPHER_KEY;
            header[23..27].copy_from_slice(&key.to_le_bytes());
        }

        let mut framed = Vec::with_capacity(HEADER_SIZE + buf.len_bytes());
        framed.extend_from_slice(&header);
        framed.extend_from_slice(buf.as_slice());
        buf.replace(framed, 1);
        Ok(())
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        _stats: &mut DecodeStats,
    ) -> Result<()> {
        if buf.len_bytes() < HEADER_SIZE {
            return misaligned_error("packet header: frame shorter than the header");
        }
        let session = self.session()?;

        let header = &buf.as_slice()[..HEADER_SIZE];

        let name_end = header[..SCHEME_FIELD].iter().position(|&b| b == 0).unwrap_or(SCHEME_FIELD);
        let scheme = session.scheme().as_bytes();
        let expect = &scheme[..scheme.len().min(SCHEME_FIELD)];
        if &header[..name_end] != expect {
            return incompatible_header_error("frame was coded under a different scheme");
        }

        let major = u16::from_le_bytes([header[16], header[17]]);
        let minor = u16::from_le_bytes([header[18], header[19]]);
        if Version::new(major, minor) != session.version() {
            return incompatible_header_error("frame format version mismatch");
        }

        if u32::from(header[20]) != session.modulation() {
            warn!("packet header: frame declares modulation {}", header[20]);
        }
        if SymbolAlignment::from_tag(header[21]) != Some(session.alignment()) {
            warn!("packet header: frame declares alignment {}", header[21]);
        }

        if header[22] & FLAG_CIPHER_KEY != 0 {
            let key = u32::from_le_bytes([header[23], header[24], header[25], header[26]]);
            session.set_cipher_key(key);
        }

        let payload = buf.as_slice()[HEADER_SIZE..].to_vec();
        buf.replace(payload, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::Config;
    use reelcode_core::dispatcher::{MODULATION_PAM4, VERSION_1_0};
    use reelcode_core::errors::Error;

    fn bound_codec(session: &SessionState) -> PacketHeaderCodec {
        let mut codec = PacketHeaderCodec::try_new(&Properties::new(), &Config::new()).unwrap();
        codec.bind_session(session);
        codec
    }

    fn session() -> SessionState {
        SessionState::new("4kv1", VERSION_1_0, MODULATION_PAM4, SymbolAlignment::Byte)
    }

    #[test]
    fn verify_round_trip() {
        let session = session();
        let mut codec = bound_codec(&session);

        let payload: Vec<u8> = (0..32).collect();
        let mut buf = DataBuffer::from_bytes(payload.clone());
        codec.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), HEADER_SIZE + 32);
        assert_eq!(&buf.as_slice()[..4], b"4kv1");
        // Version serialises little-endian as two u16 values.
        assert_eq!(&buf.as_slice()[16..20], &[1, 0, 0, 0]);

        let mut stats = DecodeStats::new();
        codec.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_scheme_mismatch_is_incompatible() {
        let mut encoder = bound_codec(&SessionState::new(
            "other",
            VERSION_1_0,
            MODULATION_PAM4,
            SymbolAlignment::Byte,
        ));
        let mut decoder = bound_codec(&session());

        let mut buf = DataBuffer::from_bytes(vec![0; 8]);
        encoder.encode(&mut buf).unwrap();

        let mut stats = DecodeStats::new();
        let result = decoder.decode(&mut buf, &[], &mut stats);
        assert!(matches!(result, Err(Error::IncompatibleHeader(_))));
    }

    #[test]
    fn verify_version_mismatch_is_incompatible() {
        let session = session();
        let mut codec = bound_codec(&session);

        let mut buf = DataBuffer::from_bytes(vec![0; 8]);
        codec.encode(&mut buf).unwrap();
        // Bump the minor version field.
        buf.as_slice_mut()[18] = 9;

        let mut stats = DecodeStats::new();
        let result = codec.decode(&mut buf, &[], &mut stats);
        assert!(matches!(result, Err(Error::IncompatibleHeader(_))));
    }

    #[test]
    fn verify_cipher_key_transport() {
        let sender = session();
        let mut encoder = bound_codec(&sender);
        sender.set_cipher_key(0xfeed_beef);

        let mut buf = DataBuffer::from_bytes(vec![0; 8]);
        encoder.encode(&mut buf).unwrap();

        let receiver = session();
        let mut decoder = bound_codec(&receiver);
        assert_eq!(receiver.cipher_key(), None);

        let mut stats = DecodeStats::new();
        decoder.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(receiver.cipher_key(), Some(0xfeed_beef));
    }

    #[test]
    fn verify_capacity_accounts_for_header() {
        let mut codec = bound_codec(&session());
        codec.init_capacity(1024).unwrap();
        assert_eq!(codec.spec().encoded_data_size, 1024);
        assert_eq!(codec.spec().decoded_data_size, 1024 - HEADER_SIZE);
        assert!(codec.init_capacity(HEADER_SIZE).is_err());
    }
}

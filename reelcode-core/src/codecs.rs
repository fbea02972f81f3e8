// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `codecs` module provides the traits and support structures necessary to implement
//! pipeline stages, and the registry used to instantiate them by name.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bitflags::bitflags;

use crate::buffer::DataBuffer;
use crate::config::{Config, Properties};
use crate::dispatcher::{SymbolAlignment, Version};
use crate::errors::{unknown_codec_error, Result};
use crate::stats::DecodeStats;

bitflags! {
    /// Capability flags carried by every stage descriptor.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CodecFlags: u32 {
        /// The stage can correct channel errors and contributes to the FEC counters.
        const ERROR_CORRECTING = 1 << 0;
        /// Input shorter than the decoded data size is zero-padded by the dispatcher before
        /// encode.
        const PRE_ZERO_PAD = 1 << 1;
        /// The stage holds no mutable cross-call state and may be shared between dispatchers
        /// under external locking. Stages without this flag (the FTF interleaver, the fiducial
        /// stages) must be owned by exactly one dispatcher.
        const REENTRANT = 1 << 2;
    }
}

/// The descriptor data every stage embeds: capability flags, block and symbol geometry, and
/// the data-level sizes derived from the pipeline capacity.
///
/// Block sizes are in buffer bytes, symbol sizes in bits. `decoded_*` refers to the payload
/// side of the stage, `encoded_*` to the wire side.
#[derive(Clone, Copy, Debug)]
pub struct CodecSpec {
    pub flags: CodecFlags,
    pub decoded_block_size: usize,
    pub encoded_block_size: usize,
    pub decoded_symbol_size: u32,
    pub encoded_symbol_size: u32,
    pub decoded_data_size: usize,
    pub encoded_data_size: usize,
}

impl CodecSpec {
    /// Derive the data-level sizes from an encoded-buffer capacity using the block geometry.
    /// Capacity that does not fill a whole block is left unused.
    pub fn init_capacity(&mut self, size: usize) -> Result<()> {
        let blocks = size / self.encoded_block_size;
        self.decoded_data_size = self.decoded_block_size * blocks;
        self.encoded_data_size = self.encoded_block_size * blocks;
        Ok(())
    }
}

impl Default for CodecSpec {
    fn default() -> Self {
        CodecSpec {
            flags: CodecFlags::PRE_ZERO_PAD | CodecFlags::REENTRANT,
            decoded_block_size: 1,
            encoded_block_size: 1,
            decoded_symbol_size: 8,
            encoded_symbol_size: 8,
            decoded_data_size: 1,
            encoded_data_size: 1,
        }
    }
}

/// Session-wide values the dispatcher shares with the stages it owns: the scheme identity
/// written into and validated against the packet header, and the whitening key slot the cipher
/// and header stages communicate through.
#[derive(Clone, Debug)]
pub struct SessionState {
    scheme: String,
    version: Version,
    modulation: u32,
    alignment: SymbolAlignment,
    // 0 is the unset sentinel; a present key k is stored as (1 << 32) | k.
    cipher_key: Arc<AtomicU64>,
}

impl SessionState {
    pub fn new(scheme: &str, version: Version, modulation: u32, alignment: SymbolAlignment) -> Self {
        SessionState {
            scheme: scheme.to_string(),
            version,
            modulation,
            alignment,
            cipher_key: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn modulation(&self) -> u32 {
        self.modulation
    }

    pub fn alignment(&self) -> SymbolAlignment {
        self.alignment
    }

    /// Publish the whitening key for the current session.
    pub fn set_cipher_key(&self, key: u32) {
        self.cipher_key.store(1u64 << 32 | u64::from(key), Ordering::Relaxed);
    }

    pub fn cipher_key(&self) -> Option<u32> {
        match self.cipher_key.load(Ordering::Relaxed) {
            0 => None,
            v => Some(v as u32),
        }
    }

    pub fn clear_cipher_key(&self) {
        self.cipher_key.store(0, Ordering::Relaxed);
    }
}

/// A `Codec` implements one stage of the coding pipeline: an invertible transformation of the
/// data buffer, with `decode` undoing `encode` up to the stage's error-correction capability.
pub trait Codec: Send {
    /// The registry name of the stage.
    fn name(&self) -> &'static str;

    /// The stage descriptor.
    fn spec(&self) -> &CodecSpec;

    fn spec_mut(&mut self) -> &mut CodecSpec;

    /// Derive the stage's data-level sizes from an encoded-side capacity. The dispatcher calls
    /// this once per stage, wire side first, threading each stage's decoded size into its
    /// upstream neighbour.
    fn init_capacity(&mut self, size: usize) -> Result<()> {
        self.spec_mut().init_capacity(size)
    }

    /// Receive the session-wide state. Stages that serialise or consume session identity (the
    /// packet header, the auto-keyed cipher) override this; the default keeps nothing.
    fn bind_session(&mut self, _session: &SessionState) {}

    /// Transform the buffer towards the wire.
    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()>;

    /// Invert the stage's transformation. Correctable channel errors are repaired and counted
    /// in `stats`; uncorrectable blocks are left as-is and counted as unresolved.
    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        erasures: &[usize],
        stats: &mut DecodeStats,
    ) -> Result<()>;

    /// Clear per-session state. The dispatcher resets every stage at the start of each
    /// encode/decode session.
    fn reset(&mut self) {}
}

/// A `CodecDescriptor` stores the registry name of a single stage together with its
/// instantiation function.
#[derive(Copy, Clone)]
pub struct CodecDescriptor {
    /// The exact name the stage is configured under.
    pub name: &'static str,
    /// An instantiation function for the stage.
    pub inst_func: fn(&Properties, &Config) -> Result<Box<dyn Codec>>,
}

/// A `CodecRegistry` allows the registration of codecs, and provides a method to instantiate a
/// stage from its configured name. The registry is owned by the caller and handed to each
/// dispatcher; it is never process-global.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: HashMap<&'static str, CodecDescriptor>,
}

impl CodecRegistry {
    /// Instantiate a new `CodecRegistry`.
    pub fn new() -> Self {
        CodecRegistry { codecs: HashMap::new() }
    }

    /// Gets the `CodecDescriptor` for a registered codec.
    pub fn get_codec(&self, name: &str) -> Option<&CodecDescriptor> {
        self.codecs.get(name)
    }

    /// Register a single codec. If the codec was previously registered it will be replaced
    /// within the registry.
    pub fn register(&mut self, descriptor: &CodecDescriptor) {
        self.codecs.insert(descriptor.name, *descriptor);
    }

    /// Searches the registry for the named stage and instantiates it with the provided
    /// properties. Returns `UnknownCodec` if the name is not registered, or the stage's own
    /// construction error if the properties are insufficient or invalid.
    pub fn make(
        &self,
        name: &str,
        properties: &Properties,
        config: &Config,
    ) -> Result<Box<dyn Codec>> {
        if let Some(descriptor) = self.codecs.get(name) {
            (descriptor.inst_func)(properties, config)
        }
        else {
            unknown_codec_error(name)
        }
    }
}

/// Convenience macro for declaring a `CodecDescriptor`.
#[macro_export]
macro_rules! support_codec {
    ($name:expr, $codec:ty) => {
        $crate::codecs::CodecDescriptor {
            name: $name,
            inst_func: |properties, config| {
                Ok(Box::new(<$codec>::try_new(properties, config)?))
            },
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::VERSION_1_0;
    use crate::errors::Error;

    #[test]
    fn verify_default_capacity_derivation() {
        let mut spec = CodecSpec { decoded_block_size: 223, encoded_block_size: 255, ..Default::default() };

        spec.init_capacity(2 * 255).unwrap();
        assert_eq!(spec.encoded_data_size, 510);
        assert_eq!(spec.decoded_data_size, 446);

        // A trailing partial block is unused capacity.
        spec.init_capacity(2 * 255 + 100).unwrap();
        assert_eq!(spec.encoded_data_size, 510);
        assert_eq!(spec.decoded_data_size, 446);
    }

    #[test]
    fn verify_registry_rejects_unknown_names() {
        let registry = CodecRegistry::new();
        let result = registry.make("NoSuchCodec", &Properties::new(), &Config::new());

        assert!(matches!(result, Err(Error::UnknownCodec(_))));
    }

    #[test]
    fn verify_session_key_slot() {
        let session = SessionState::new("test", VERSION_1_0, 2, SymbolAlignment::Bit);
        assert_eq!(session.cipher_key(), None);

        session.set_cipher_key(0);
        assert_eq!(session.cipher_key(), Some(0));

        session.set_cipher_key(0xdeadbeef);
        assert_eq!(session.cipher_key(), Some(0xdeadbeef));

        session.clear_cipher_key();
        assert_eq!(session.cipher_key(), None);
    }
}

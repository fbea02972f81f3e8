// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! # Project Reelcode
//!
//! Reelcode is the coding pipeline of a visual-carrier archival system. A payload packet
//! enters as raw bytes, passes through a configurable chain of transformation stages
//! (error-correction coding, interleaving, whitening, framing, modulation, fiducial
//! insertion), and emerges as a stream of symbol values ready to be rasterised onto frames.
//! The inverse pipeline reconstructs the original bytes from noisy symbols, correcting errors
//! where possible and reporting residual error metrics.
//!
//! # Usage
//!
//! 1. Instantiate a [`CodecRegistry`][core::codecs::CodecRegistry] and register the stages of
//!    interest, or use [`default::get_codecs`] to get the default registry with every built-in
//!    stage pre-registered.
//! 2. Describe the coding scheme in a [`Config`][core::config::Config]: an ordered list of
//!    stage names with their property tables, payload side first.
//! 3. Build a [`CodecDispatcher`][core::dispatcher::CodecDispatcher] from the packet size, the
//!    modulation level, the configuration, the scheme name, and the registry.
//! 4. Call [`encode`][core::dispatcher::CodecDispatcher::encode] per frame buffer to produce
//!    wire frames, and [`decode`][core::dispatcher::CodecDispatcher::decode] with a
//!    [`DecodeStats`][core::stats::DecodeStats] record to recover them.
//! 5. Call [`reset`][core::dispatcher::CodecDispatcher::reset] between sessions; when the
//!    scheme is striped, feed the encoder `stripe − 1` trailing fill frames so the inter-frame
//!    delay line flushes.
//!
//! # Adding new stages
//!
//! Implement the [`Codec`][core::codecs::Codec] trait and register the stage with the
//! registry under its configuration name.

pub use reelcode_core as core;

pub mod default {
    //! The `default` module provides convenience functions and registries to get an
    //! implementer up-and-running as quickly as possible. Using the `default` module is
    //! completely optional and incurs no overhead unless actually used.

    use lazy_static::lazy_static;

    use reelcode_core::codecs::CodecRegistry;

    lazy_static! {
        static ref CODEC_REGISTRY: CodecRegistry = {
            let mut registry = CodecRegistry::new();
            reelcode_codecs::register_enabled_codecs(&mut registry);
            registry
        };
    }

    /// Gets the default `CodecRegistry` with every built-in stage registered.
    pub fn get_codecs() -> &'static CodecRegistry {
        &CODEC_REGISTRY
    }

    pub mod codecs {
        //! The `codecs` module re-exports all built-in Reelcode stages.

        pub use reelcode_codecs::BchCodec;
        pub use reelcode_codecs::CipherCodec;
        pub use reelcode_codecs::Crc32Codec;
        pub use reelcode_codecs::Crc64Codec;
        pub use reelcode_codecs::FtfInterleavingCodec;
        pub use reelcode_codecs::InterleavingCodec;
        pub use reelcode_codecs::LdpcCodec;
        pub use reelcode_codecs::ModulatorCodec;
        pub use reelcode_codecs::PacketHeaderCodec;
        pub use reelcode_codecs::Pam2dCodec;
        pub use reelcode_codecs::ReedSolomonCodec;
        pub use reelcode_codecs::SymbolConverterCodec;
        pub use reelcode_codecs::SyncPointInserterCodec;
    }
}

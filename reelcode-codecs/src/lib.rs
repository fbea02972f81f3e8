// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]
// The following lints are allowed in all Reelcode crates. Please see the root Cargo.toml for
// their justification.
#![allow(clippy::comparison_chain)]
#![allow(clippy::identity_op)]
#![allow(clippy::manual_range_contains)]

//! Implementations of every built-in pipeline stage. Stages are registered by their exact
//! configuration names; see [`register_enabled_codecs`].

use reelcode_core::codecs::CodecRegistry;
use reelcode_core::support_codec;

mod bch;
mod cipher;
mod crc;
mod ftf;
mod interleaving;
mod ldpc;
mod modulator;
mod packet_header;
mod pam2d;
mod reed_solomon;
mod symbol_converter;
mod sync_point;

pub use bch::BchCodec;
pub use cipher::CipherCodec;
pub use crc::{Crc32Codec, Crc64Codec};
pub use ftf::FtfInterleavingCodec;
pub use interleaving::InterleavingCodec;
pub use ldpc::LdpcCodec;
pub use modulator::ModulatorCodec;
pub use packet_header::PacketHeaderCodec;
pub use pam2d::Pam2dCodec;
pub use reed_solomon::ReedSolomonCodec;
pub use symbol_converter::SymbolConverterCodec;
pub use sync_point::SyncPointInserterCodec;

/// Register every built-in stage with the given registry.
pub fn register_enabled_codecs(registry: &mut CodecRegistry) {
    registry.register(&support_codec!("Interleaving", InterleavingCodec));
    registry.register(&support_codec!("Cipher", CipherCodec));
    registry.register(&support_codec!("ReedSolomon", ReedSolomonCodec));
    registry.register(&support_codec!("Modulator", ModulatorCodec));
    registry.register(&support_codec!("SyncPointInserter", SyncPointInserterCodec));
    registry.register(&support_codec!("CRC32", Crc32Codec));
    registry.register(&support_codec!("CRC64", Crc64Codec));
    registry.register(&support_codec!("FTFInterleaving", FtfInterleavingCodec));
    registry.register(&support_codec!("PacketHeader", PacketHeaderCodec));
    registry.register(&support_codec!("2DPAM", Pam2dCodec));
    registry.register(&support_codec!("SymbolConverter", SymbolConverterCodec));
    registry.register(&support_codec!("BCH", BchCodec));
    registry.register(&support_codec!("LDPC", LdpcCodec));
}

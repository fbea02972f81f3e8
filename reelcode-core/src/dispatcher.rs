// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `dispatcher` module builds the ordered stage chain of a coding scheme and runs buffers
//! through it, forward on encode and in reverse on decode.

use std::fmt;

use log::debug;

use crate::buffer::DataBuffer;
use crate::codecs::{Codec, CodecFlags, CodecRegistry, SessionState};
use crate::config::Config;
use crate::errors::{invalid_property_error, misaligned_error, Result};
use crate::stats::DecodeStats;

/// Two-level pulse-amplitude modulation (bilevel pixels).
pub const MODULATION_PAM2: u32 = 2;
/// Four-level pulse-amplitude modulation.
pub const MODULATION_PAM4: u32 = 4;
/// Six-level pulse-amplitude modulation.
pub const MODULATION_PAM6: u32 = 6;

/// A dispatcher version. Comparison is lexicographic on (major, minor).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}

impl Version {
    pub const fn new(major: u16, minor: u16) -> Version {
        Version { major, minor }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The current frame format version.
pub const VERSION_1_0: Version = Version::new(1, 0);
/// The legacy pre-1.0 frame format version.
pub const VERSION_PRE_1_0: Version = Version::new(0, 9);

/// Whether payload symbols may straddle byte boundaries on the carrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolAlignment {
    Bit,
    Byte,
}

impl SymbolAlignment {
    pub fn to_tag(self) -> u8 {
        match self {
            SymbolAlignment::Bit => 0,
            SymbolAlignment::Byte => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<SymbolAlignment> {
        match tag {
            0 => Some(SymbolAlignment::Bit),
            1 => Some(SymbolAlignment::Byte),
            _ => None,
        }
    }
}

/// A `CodecDispatcher` owns the ordered stage chain of one coding scheme. The payload buffer is
/// handed to stage 0 on encode, each stage rewriting it in place; decode runs the chain in
/// reverse. One dispatcher serves one thread; the stages it owns are not shareable.
pub struct CodecDispatcher {
    stages: Vec<Box<dyn Codec>>,
    packet_size: usize,
    modulation: u32,
    alignment: SymbolAlignment,
    color_depth: u8,
    scheme: String,
    version: Version,
    stripe_size: u32,
    session: SessionState,
}

impl CodecDispatcher {
    /// Build the stage chain of `scheme` from the configuration, instantiating each stage
    /// through `registry`, and derive every stage's data sizes from the wire-side
    /// `packet_size`. Construction fails on an unknown scheme, an unknown codec name, or any
    /// stage whose properties are missing or out of range.
    pub fn new(
        packet_size: usize,
        modulation_levels: u32,
        config: &Config,
        scheme: &str,
        registry: &CodecRegistry,
    ) -> Result<CodecDispatcher> {
        let (alignment, color_depth) = match modulation_levels {
            MODULATION_PAM2 => (SymbolAlignment::Bit, 1),
            MODULATION_PAM4 => (SymbolAlignment::Byte, 2),
            MODULATION_PAM6 => (SymbolAlignment::Byte, 8),
            _ => return invalid_property_error("modulation levels must be 2, 4 or 6"),
        };

        let Some(scheme_config) = config.scheme(scheme) else {
            return invalid_property_error("unknown coding scheme");
        };
        if scheme_config.stages.is_empty() {
            return invalid_property_error("coding scheme has no stages");
        }

        let session = SessionState::new(scheme, VERSION_1_0, modulation_levels, alignment);

        let mut stages = Vec::with_capacity(scheme_config.stages.len());
        for stage_config in &scheme_config.stages {
            let mut codec = registry.make(&stage_config.name, &stage_config.properties, config)?;
            codec.bind_session(&session);
            stages.push(codec);
        }

        // Derive sizes bottom-up: the wire-side stage absorbs the packet capacity and each
        // earlier stage receives its successor's decoded size.
        let mut capacity = packet_size;
        for stage in stages.iter_mut().rev() {
            stage.init_capacity(capacity)?;
            capacity = stage.spec().decoded_data_size;
        }

        for stage in stages.iter() {
            debug!(
                "dispatcher: stage {}: {} -> {} bytes",
                stage.name(),
                stage.spec().decoded_data_size,
                stage.spec().encoded_data_size
            );
        }

        Ok(CodecDispatcher {
            stages,
            packet_size,
            modulation: modulation_levels,
            alignment,
            color_depth,
            scheme: scheme.to_string(),
            version: VERSION_1_0,
            stripe_size: config.stripe_size(scheme),
            session,
        })
    }

    /// Run every stage over the buffer in scheme order.
    pub fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        for step in 0..self.stages.len() {
            self.encode_step(buf, step)?;
        }
        Ok(())
    }

    /// Run a single encode stage. Steps count from the payload side.
    pub fn encode_step(&mut self, buf: &mut DataBuffer, step: usize) -> Result<()> {
        let stage = &mut self.stages[step];
        let expect = stage.spec().decoded_data_size;

        if buf.len_bytes() < expect && stage.spec().flags.contains(CodecFlags::PRE_ZERO_PAD) {
            buf.resize_bytes(expect);
        }
        if buf.len_bytes() != expect {
            return misaligned_error("encode input does not fill the stage capacity");
        }

        stage.encode(buf)
    }

    /// Run every stage in reverse order, undoing the scheme. Stops early when a stage withholds
    /// output (the inter-frame interleaver during its preload).
    pub fn decode(&mut self, buf: &mut DataBuffer, stats: &mut DecodeStats) -> Result<()> {
        for step in 0..self.stages.len() {
            self.decode_step(buf, &[], step, stats)?;
            if buf.is_empty() {
                break;
            }
        }
        Ok(())
    }

    /// Run a single decode stage. Steps count from the wire side.
    pub fn decode_step(
        &mut self,
        buf: &mut DataBuffer,
        erasures: &[usize],
        step: usize,
        stats: &mut DecodeStats,
    ) -> Result<()> {
        let at = self.stages.len() - 1 - step;
        let stage = &mut self.stages[at];

        // Alignment padding added on the encode side ends at the stage's data-size contract.
        let expect = stage.spec().encoded_data_size;
        if buf.len_bytes() > expect {
            buf.resize_bytes(expect);
        }

        stage.decode(buf, erasures, stats)
    }

    /// Reset every stage and the session state. Call before starting a new encode or decode
    /// session; this clears the inter-frame preload counter and the whitening key slot.
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
        self.session.clear_cipher_key();
    }

    /// The number of stages in the chain.
    pub fn coding_steps(&self) -> usize {
        self.stages.len()
    }

    /// The stage run at encode step `step`.
    pub fn encode_codec(&self, step: usize) -> Option<&dyn Codec> {
        self.stages.get(step).map(|c| c.as_ref())
    }

    /// The stage run at decode step `step`.
    pub fn decode_codec(&self, step: usize) -> Option<&dyn Codec> {
        let len = self.stages.len();
        if step < len {
            self.stages.get(len - 1 - step).map(|c| c.as_ref())
        }
        else {
            None
        }
    }

    /// Payload capacity of one frame: the decoded data size of the first stage.
    pub fn get_bytes_per_frame(&self) -> usize {
        self.stages.first().map(|s| s.spec().decoded_data_size).unwrap_or(0)
    }

    /// The size of a fully encoded frame: the encoded data size of the last stage.
    pub fn get_encoded_packet_size(&self) -> usize {
        self.stages.last().map(|s| s.spec().encoded_data_size).unwrap_or(0)
    }

    pub fn get_decoded_packet_size(&self) -> usize {
        self.get_bytes_per_frame()
    }

    /// Encoded size after the given encode step.
    pub fn get_encoded_packet_size_step(&self, step: usize) -> usize {
        self.stages.get(step).map(|s| s.spec().encoded_data_size).unwrap_or(0)
    }

    /// Decoded size before the given encode step.
    pub fn get_decoded_packet_size_step(&self, step: usize) -> usize {
        self.stages.get(step).map(|s| s.spec().decoded_data_size).unwrap_or(0)
    }

    /// The number of frames needed to fully encode `file_size` payload bytes, including the
    /// trailing fill frames the inter-frame interleaver needs to flush its delay line.
    pub fn get_data_frames(&self, file_size: u64) -> u64 {
        let bpf = self.get_bytes_per_frame() as u64;
        if bpf == 0 {
            return 0;
        }

        let mut frames = file_size.div_ceil(bpf);
        if self.stripe_size > 1 {
            frames += u64::from(self.stripe_size) - 1;
        }
        frames
    }

    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    pub fn modulation(&self) -> u32 {
        self.modulation
    }

    pub fn symbol_alignment(&self) -> SymbolAlignment {
        self.alignment
    }

    pub fn color_depth(&self) -> u8 {
        self.color_depth
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn stripe_size(&self) -> u32 {
        self.stripe_size
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }
}

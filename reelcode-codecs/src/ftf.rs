// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inter-frame (frame-to-frame) interleaving: a circular delay line of `DataStripeSize` frame
//! buffers acting as a commutator, so byte n of a logical frame is spread over n consecutive
//! carrier frames.
//!
//! On encode, frame bytes are scattered across the ring starting at the current slot, the ring
//! rotates one step back, and the buffer at the new current slot is swapped out as the emitted
//! frame. Decode mirrors the rotation and gathers bytes back, withholding output for the first
//! `distance − 1` frames after a reset to cover the encode-side latency. The sole stage with
//! cross-frame state; a dispatcher must not share it.

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecFlags, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{
    invalid_property_error, misaligned_error, missing_property_error, Result,
};
use reelcode_core::stats::DecodeStats;

/// The delay line: `distance` frame buffers and a rotating head index. Walking forward from
/// the head is index arithmetic and the head swap stays O(1).
struct Ring {
    slots: Vec<Vec<u8>>,
    head: usize,
}

impl Ring {
    fn new(distance: usize, frame_size: usize) -> Ring {
        Ring { slots: vec![vec![0; frame_size]; distance], head: 0 }
    }

    fn step_back(&mut self) {
        self.head = (self.head + self.slots.len() - 1) % self.slots.len();
    }
}

pub struct FtfInterleavingCodec {
    spec: CodecSpec,
    distance: usize,
    preload_frames: usize,
    encode_ring: Option<Ring>,
    decode_ring: Option<Ring>,
}

impl FtfInterleavingCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let Some(distance) = properties.usize_value(keys::DATA_STRIPE_SIZE) else {
            return missing_property_error(keys::DATA_STRIPE_SIZE);
        };
        if distance == 0 {
            return invalid_property_error("ftf: stripe size must be non-zero");
        }

        let mut flags = CodecSpec::default().flags;
        flags.remove(CodecFlags::REENTRANT);
        let spec = CodecSpec { flags, ..Default::default() };

        Ok(FtfInterleavingCodec {
            spec,
            distance,
            preload_frames: distance - 1,
            encode_ring: None,
            decode_ring: None,
        })
    }
}

impl Codec for FtfInterleavingCodec {
    fn name(&self) -> &'static str {
        "FTFInterleaving"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    // A whole-frame stage: the delay line carries frames of whatever size the pipeline runs.
    fn init_capacity(&mut self, size: usize) -> Result<()> {
        let spec = self.spec_mut();
        spec.encoded_block_size = size;
        spec.encoded_data_size = size;
        spec.decoded_block_size = size;
        spec.decoded_data_size = size;
        Ok(())
    }

    fn reset(&mut self) {
        self.preload_frames = self.distance - 1;
        self.encode_ring = None;
        self.decode_ring = None;
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        let distance = self.distance;
        let size = buf.len_bytes();
        let ring = self.encode_ring.get_or_insert_with(|| Ring::new(distance, size));
        if ring.slots[0].len() != size {
            return misaligned_error("ftf: frame size changed mid-session");
        }

        // Scatter the frame across successive ring slots, one byte per step.
        let data = buf.as_slice();
        for (n, &byte) in data.iter().enumerate() {
            ring.slots[(ring.head + n) % distance][n] = byte;
        }

        // Rotate and emit the buffer that has finished its trip through the line.
        ring.step_back();
        buf.swap_bytes(&mut ring.slots[ring.head]);
        Ok(())
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        stats: &mut DecodeStats,
    ) -> Result<()> {
        let distance = self.distance;
        let size = buf.len_bytes();
        let ring = self.decode_ring.get_or_insert_with(|| Ring::new(distance, size));
        if ring.slots[0].len() != size {
            return misaligned_error("ftf: frame size changed mid-session");
        }

        // Mirror order: rotate first, then park the incoming frame at the new head.
        ring.step_back();
        buf.swap_bytes(&mut ring.slots[ring.head]);

        if self.preload_frames > 0 {
            self.preload_frames -= 1;
            buf.clear();
            stats.reset();
            return Ok(());
        }

        // Gather the reassembled frame from the line, starting at the head.
        let out = buf.as_slice_mut();
        for (n, byte) in out.iter_mut().enumerate() {
            *byte = ring.slots[(ring.head + n) % distance][n];
        }

        stats.reset();
        Ok(())
    }
}

// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Overlays fiducial marks on the frame bitmap: at each grid position a foreground centre
//! surrounded by a background disc of the configured radius. Payload pixels flow row-major
//! around the fiducials on encode and are picked back out on decode; the geometric alignment
//! that consumes the marks happens outside the coding core.

use log::debug;

use reelcode_core::buffer::DataBuffer;
use reelcode_core::codecs::{Codec, CodecFlags, CodecSpec};
use reelcode_core::config::{keys, Config, Properties};
use reelcode_core::errors::{
    invalid_property_error, misaligned_error, missing_property_error, Result,
};
use reelcode_core::stats::DecodeStats;

const DEFAULT_RADIUS: usize = 2;

pub struct SyncPointInserterCodec {
    spec: CodecSpec,
    width: usize,
    height: usize,
    /// Pixel value per fiducial position, indexed frame-order.
    overlay: Vec<(usize, u8)>,
    /// Per-pixel fiducial membership.
    is_sync: Vec<bool>,
}

impl SyncPointInserterCodec {
    pub fn try_new(properties: &Properties, _config: &Config) -> Result<Self> {
        let Some(width) = properties.usize_value(keys::IMAGE_WIDTH) else {
            return missing_property_error(keys::IMAGE_WIDTH);
        };
        let Some(height) = properties.usize_value(keys::IMAGE_HEIGHT) else {
            return missing_property_error(keys::IMAGE_HEIGHT);
        };
        if width == 0 || height == 0 {
            return invalid_property_error("sync point inserter: empty frame geometry");
        }

        let radius = properties.usize_value(keys::SYNC_POINT_RADIUS).unwrap_or(DEFAULT_RADIUS);
        let h_distance =
            properties.usize_value(keys::SYNC_POINT_H_DISTANCE).unwrap_or(width);
        let v_distance =
            properties.usize_value(keys::SYNC_POINT_V_DISTANCE).unwrap_or(height);
        let h_offset =
            properties.usize_value(keys::SYNC_POINT_H_OFFSET).unwrap_or(h_distance / 2);
        let v_offset =
            properties.usize_value(keys::SYNC_POINT_V_OFFSET).unwrap_or(v_distance / 2);
        if h_distance == 0 || v_distance == 0 {
            return invalid_property_error("sync point inserter: zero grid distance");
        }

        let foreground =
            properties.u32_value(keys::SYNC_POINT_FOREGROUND).unwrap_or(1) as u8;
        let background =
            properties.u32_value(keys::SYNC_POINT_BACKGROUND).unwrap_or(0) as u8;

        let mut is_sync = vec![false; width * height];
        let mut overlay = Vec::new();
        let r2 = (radius * radius) as i64;

        for cy in (v_offset..height).step_by(v_distance) {
            for cx in (h_offset..width).step_by(h_distance) {
                for y in cy.saturating_sub(radius)..=(cy + radius).min(height - 1) {
                    for x in cx.saturating_sub(radius)..=(cx + radius).min(width - 1) {
                        let dx = x as i64 - cx as i64;
                        let dy = y as i64 - cy as i64;
                        if dx * dx + dy * dy > r2 {
                            continue;
                        }
                        let at = y * width + x;
                        if !is_sync[at] {
                            is_sync[at] = true;
                            let value =
                                if x == cx && y == cy { foreground } else { background };
                            overlay.push((at, value));
                        }
                    }
                }
            }
        }
        overlay.sort_by_key(|&(at, _)| at);

        if overlay.len() >= width * height {
            return invalid_property_error("sync point inserter: fiducials cover every pixel");
        }

        debug!(
            "sync point inserter: {}x{} frame, {} fiducial pixels",
            width,
            height,
            overlay.len()
        );

        let mut flags = CodecSpec::default().flags;
        flags.remove(CodecFlags::REENTRANT);
        let spec = CodecSpec { flags, ..Default::default() };

        Ok(SyncPointInserterCodec { spec, width, height, overlay, is_sync })
    }

    /// Total pixels of one frame.
    pub fn frame_pixels(&self) -> usize {
        self.width * self.height
    }

    /// Pixels left for payload after the fiducials.
    pub fn data_pixels(&self) -> usize {
        self.frame_pixels() - self.overlay.len()
    }
}

impl Codec for SyncPointInserterCodec {
    fn name(&self) -> &'static str {
        "SyncPointInserter"
    }

    fn spec(&self) -> &CodecSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut CodecSpec {
        &mut self.spec
    }

    // The frame geometry is fixed by configuration; a capacity that differs from it is a
    // configuration error, not a truncation opportunity.
    fn init_capacity(&mut self, size: usize) -> Result<()> {
        if size != self.frame_pixels() {
            return misaligned_error("sync point inserter: capacity differs from frame geometry");
        }
        let data = self.data_pixels();
        let spec = self.spec_mut();
        spec.encoded_block_size = size;
        spec.encoded_data_size = size;
        spec.decoded_block_size = data;
        spec.decoded_data_size = data;
        Ok(())
    }

    fn encode(&mut self, buf: &mut DataBuffer) -> Result<()> {
        if buf.len_bytes() != self.data_pixels() {
            return misaligned_error("sync point inserter: payload does not fit the frame");
        }

        let mut frame = vec![0u8; self.frame_pixels()];
        let mut data = buf.as_slice().iter();
        for (at, pixel) in frame.iter_mut().enumerate() {
            if !self.is_sync[at] {
                *pixel = *data.next().unwrap_or(&0);
            }
        }
        for &(at, value) in &self.overlay {
            frame[at] = value;
        }

        buf.replace(frame, 1);
        Ok(())
    }

    fn decode(
        &mut self,
        buf: &mut DataBuffer,
        _erasures: &[usize],
        _stats: &mut DecodeStats,
    ) -> Result<()> {
        if buf.len_bytes() != self.frame_pixels() {
            return misaligned_error("sync point inserter: buffer does not match frame geometry");
        }

        let mut data = Vec::with_capacity(self.data_pixels());
        for (at, &pixel) in buf.as_slice().iter().enumerate() {
            if !self.is_sync[at] {
                data.push(pixel);
            }
        }

        buf.replace(data, 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcode_core::config::Config;

    fn codec(width: usize, height: usize, radius: usize, distance: usize) -> SyncPointInserterCodec {
        let mut properties = Properties::new();
        properties.insert(keys::IMAGE_WIDTH, width);
        properties.insert(keys::IMAGE_HEIGHT, height);
        properties.insert(keys::SYNC_POINT_RADIUS, radius);
        properties.insert(keys::SYNC_POINT_H_DISTANCE, distance);
        properties.insert(keys::SYNC_POINT_V_DISTANCE, distance);
        properties.insert(keys::SYNC_POINT_FOREGROUND, 3u32);
        properties.insert(keys::SYNC_POINT_BACKGROUND, 0u32);
        SyncPointInserterCodec::try_new(&properties, &Config::new()).unwrap()
    }

    #[test]
    fn verify_fiducial_geometry() {
        let inserter = codec(16, 16, 1, 8);

        // Four grid centres, each a radius-1 cross of five pixels.
        assert_eq!(inserter.frame_pixels(), 256);
        assert_eq!(inserter.data_pixels(), 256 - 4 * 5);
    }

    #[test]
    fn verify_round_trip_around_fiducials() {
        let mut inserter = codec(16, 16, 1, 8);
        let data_pixels = inserter.data_pixels();

        let payload: Vec<u8> = (0..data_pixels).map(|i| (i % 251) as u8 + 4).collect();
        let mut buf = DataBuffer::from_bytes(payload.clone());
        inserter.encode(&mut buf).unwrap();
        assert_eq!(buf.len_bytes(), 256);

        // The centres carry the foreground value.
        assert_eq!(buf.as_slice()[4 * 16 + 4], 3);
        assert_eq!(buf.as_slice()[12 * 16 + 12], 3);

        let mut stats = DecodeStats::new();
        inserter.decode(&mut buf, &[], &mut stats).unwrap();
        assert_eq!(buf.as_slice(), &payload[..]);
    }

    #[test]
    fn verify_wrong_geometry_is_rejected() {
        let mut inserter = codec(16, 16, 1, 8);

        assert!(inserter.init_capacity(200).is_err());
        assert!(inserter.init_capacity(256).is_ok());

        let mut buf = DataBuffer::from_bytes(vec![0; 100]);
        let mut stats = DecodeStats::new();
        assert!(inserter.decode(&mut buf, &[], &mut stats).is_err());
    }
}

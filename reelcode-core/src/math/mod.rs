// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `math` module provides the finite-field arithmetic and checksum calculators the
//! error-correction and integrity stages are built on.

pub mod crc32;
pub mod crc64;
pub mod gf;

pub use crc32::Crc32;
pub use crc64::Crc64;
pub use gf::GaloisField;

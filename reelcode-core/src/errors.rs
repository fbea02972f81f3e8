// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Reelcode.
#[derive(Debug)]
pub enum Error {
    /// A property required to construct a codec was absent from the property table.
    MissingProperty(&'static str),
    /// A property value was present but out of the legal range for the codec.
    InvalidProperty(&'static str),
    /// The codec name is not present in the registry.
    UnknownCodec(String),
    /// The buffer length is not a multiple of the block or symbol geometry of the stage.
    BufferMisaligned(&'static str),
    /// A forward-error-correction stage could not correct a block.
    TooManyErrors(&'static str),
    /// The packet header declared a scheme or version this dispatcher cannot process.
    IncompatibleHeader(&'static str),
    /// A Galois field could not be constructed from the given polynomial.
    InvalidField,
    /// An internal invariant of the pipeline was violated.
    InternalInvariant(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::MissingProperty(name) => {
                write!(f, "missing property: {}", name)
            }
            Error::InvalidProperty(name) => {
                write!(f, "invalid property: {}", name)
            }
            Error::UnknownCodec(ref name) => {
                write!(f, "unknown codec: {}", name)
            }
            Error::BufferMisaligned(msg) => {
                write!(f, "buffer misaligned: {}", msg)
            }
            Error::TooManyErrors(msg) => {
                write!(f, "too many errors: {}", msg)
            }
            Error::IncompatibleHeader(msg) => {
                write!(f, "incompatible header: {}", msg)
            }
            Error::InvalidField => {
                write!(f, "invalid galois field polynomial")
            }
            Error::InternalInvariant(msg) => {
                write!(f, "internal invariant violated: {}", msg)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create a missing property error.
pub fn missing_property_error<T>(name: &'static str) -> Result<T> {
    Err(Error::MissingProperty(name))
}

/// Convenience function to create an invalid property error.
pub fn invalid_property_error<T>(name: &'static str) -> Result<T> {
    Err(Error::InvalidProperty(name))
}

/// Convenience function to create an unknown codec error.
pub fn unknown_codec_error<T>(name: &str) -> Result<T> {
    Err(Error::UnknownCodec(name.to_string()))
}

/// Convenience function to create a buffer misalignment error.
pub fn misaligned_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::BufferMisaligned(msg))
}

/// Convenience function to create an uncorrectable block error.
pub fn too_many_errors_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::TooManyErrors(msg))
}

/// Convenience function to create an incompatible header error.
pub fn incompatible_header_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::IncompatibleHeader(msg))
}

/// Convenience function to create an internal invariant error.
pub fn invariant_error<T>(msg: &'static str) -> Result<T> {
    Err(Error::InternalInvariant(msg))
}

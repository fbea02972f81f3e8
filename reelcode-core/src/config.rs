// Reelcode
// Copyright (c) 2025 The Reelcode Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `config` module provides the property tables and coding-scheme configuration the
//! dispatcher and codecs are constructed from. Loading configuration from files is a concern of
//! the surrounding tooling; this module only defines the in-memory model.

use std::collections::HashMap;

/// Well-known property keys recognised by the built-in codecs.
pub mod keys {
    /// Inter-frame (FTF) interleaving distance.
    pub const DATA_STRIPE_SIZE: &str = "DataStripeSize";
    /// Intra-frame interleaving distance.
    pub const DISTANCE: &str = "distance";
    /// Message (data) size per block in items.
    pub const MESSAGE_SIZE: &str = "messageSize";
    /// Parity amount per block. For Reed-Solomon and LDPC this is the parity item count, for
    /// BCH it is the bit-correction capability t.
    pub const PARITY_SIZE: &str = "byteParityNumber";
    /// Field or checksum generator polynomial.
    pub const POLYNOM: &str = "polynom";
    /// Checksum or cipher seed.
    pub const SEED: &str = "seed";
    /// Interleaving symbol granularity: `bit` or `byte`.
    pub const SYMBOL_TYPE: &str = "symboltype";
    pub const SYMBOL_TYPE_BIT: &str = "bit";
    pub const SYMBOL_TYPE_BYTE: &str = "byte";
    /// Modulator and 2D-PAM pixel depth.
    pub const NUM_BITS_PER_PIXEL: &str = "NumBitsPerPixel";
    /// Belief-propagation iteration budget.
    pub const ITERATIONS: &str = "iterations";
    /// Scheme selectors read from the global configuration.
    pub const DATA_CODING_SCHEME: &str = "DataCodingScheme";
    pub const METADATA_CODING_SCHEME: &str = "MetadataCodingScheme";
    /// Sync-point inserter geometry.
    pub const IMAGE_WIDTH: &str = "imageWidth";
    pub const IMAGE_HEIGHT: &str = "imageHeight";
    pub const SYNC_POINT_RADIUS: &str = "syncPointRadius";
    pub const SYNC_POINT_H_DISTANCE: &str = "syncPointHDistance";
    pub const SYNC_POINT_V_DISTANCE: &str = "syncPointVDistance";
    pub const SYNC_POINT_H_OFFSET: &str = "syncPointHOffset";
    pub const SYNC_POINT_V_OFFSET: &str = "syncPointVOffset";
    pub const SYNC_POINT_FOREGROUND: &str = "syncPointForeground";
    pub const SYNC_POINT_BACKGROUND: &str = "syncPointBackground";
}

/// A typed property value. Configuration sources are text-based, so the string variant can be
/// coerced to the numeric accessors.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    UInt(u64),
}

impl Value {
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::UInt(v) => u32::try_from(v).ok(),
            Value::Int(v) => u32::try_from(v).ok(),
            Value::Str(ref s) => parse_uint(s).and_then(|v| u32::try_from(v).ok()),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::UInt(v) => Some(v),
            Value::Int(v) => u64::try_from(v).ok(),
            Value::Str(ref s) => parse_uint(s),
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_u64().and_then(|v| usize::try_from(v).ok())
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::Str(ref s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt(u64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::UInt(v as u64)
    }
}

/// Decimal or `0x`-prefixed hexadecimal.
fn parse_uint(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    }
    else {
        s.parse().ok()
    }
}

/// A string-keyed property table attached to one stage of a coding scheme.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    map: HashMap<String, Value>,
}

impl Properties {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert<V: Into<Value>>(&mut self, key: &str, value: V) -> &mut Self {
        self.map.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn u32_value(&self, key: &str) -> Option<u32> {
        self.map.get(key).and_then(Value::as_u32)
    }

    pub fn u64_value(&self, key: &str) -> Option<u64> {
        self.map.get(key).and_then(Value::as_u64)
    }

    pub fn usize_value(&self, key: &str) -> Option<usize> {
        self.map.get(key).and_then(Value::as_usize)
    }

    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.map.get(key).and_then(Value::as_str)
    }
}

/// One stage of a coding scheme: a registry name plus the stage's property table.
#[derive(Clone, Debug)]
pub struct StageConfig {
    pub name: String,
    pub properties: Properties,
}

impl StageConfig {
    pub fn new(name: &str) -> Self {
        StageConfig { name: name.to_string(), properties: Properties::new() }
    }

    pub fn with_property<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.properties.insert(key, value);
        self
    }
}

/// An ordered list of stages making up one named coding scheme. Stage 0 is the payload side;
/// the last stage is the wire side.
#[derive(Clone, Debug, Default)]
pub struct SchemeConfig {
    pub stages: Vec<StageConfig>,
}

impl SchemeConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(mut self, stage: StageConfig) -> Self {
        self.stages.push(stage);
        self
    }
}

/// The global configuration: named coding schemes plus global properties such as the scheme
/// selectors.
#[derive(Clone, Debug, Default)]
pub struct Config {
    schemes: HashMap<String, SchemeConfig>,
    globals: Properties,
}

impl Config {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_scheme(&mut self, name: &str, scheme: SchemeConfig) -> &mut Self {
        self.schemes.insert(name.to_string(), scheme);
        self
    }

    pub fn scheme(&self, name: &str) -> Option<&SchemeConfig> {
        self.schemes.get(name)
    }

    pub fn globals(&self) -> &Properties {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut Properties {
        &mut self.globals
    }

    /// The scheme selected for payload data, when the global properties name one.
    pub fn data_coding_scheme(&self) -> Option<&str> {
        self.globals.str_value(keys::DATA_CODING_SCHEME)
    }

    /// The scheme selected for metadata frames, when the global properties name one.
    pub fn metadata_coding_scheme(&self) -> Option<&str> {
        self.globals.str_value(keys::METADATA_CODING_SCHEME)
    }

    /// The inter-frame stripe distance declared by the scheme, or 1 when the scheme carries no
    /// FTF interleaving stage.
    pub fn stripe_size(&self, scheme: &str) -> u32 {
        self.scheme(scheme)
            .and_then(|s| {
                s.stages
                    .iter()
                    .find_map(|stage| stage.properties.u32_value(keys::DATA_STRIPE_SIZE))
            })
            .unwrap_or(1)
    }

    /// True when payload bytes of the scheme are distributed across multiple frames.
    pub fn is_data_striped(&self, scheme: &str) -> bool {
        self.stripe_size(scheme) > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_value_coercions() {
        assert_eq!(Value::from("285").as_u32(), Some(285));
        assert_eq!(Value::from("0x11d").as_u32(), Some(0x11d));
        assert_eq!(Value::from(7u32).as_u64(), Some(7));
        assert_eq!(Value::from("byte").as_str(), Some("byte"));
        assert_eq!(Value::from("byte").as_u32(), None);
    }

    #[test]
    fn verify_scheme_selectors() {
        let mut config = Config::new();
        assert_eq!(config.data_coding_scheme(), None);

        config.globals_mut().insert(keys::DATA_CODING_SCHEME, "4kv1");
        config.globals_mut().insert(keys::METADATA_CODING_SCHEME, "4kv1meta");
        assert_eq!(config.data_coding_scheme(), Some("4kv1"));
        assert_eq!(config.metadata_coding_scheme(), Some("4kv1meta"));
    }

    #[test]
    fn verify_stripe_size_lookup() {
        let mut config = Config::new();
        config.add_scheme(
            "striped",
            SchemeConfig::new()
                .push(StageConfig::new("ReedSolomon"))
                .push(StageConfig::new("FTFInterleaving").with_property(keys::DATA_STRIPE_SIZE, 4u32)),
        );

        assert_eq!(config.stripe_size("striped"), 4);
        assert!(config.is_data_striped("striped"));
        assert_eq!(config.stripe_size("absent"), 1);
        assert!(!config.is_data_striped("absent"));
    }
}

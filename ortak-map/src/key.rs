//! Map keys and the wire hash.

use std::borrow::Cow;

use ortak::OrtakError;

use crate::layout::{KEY_KIND_COMPOSITE, KEY_KIND_STRING};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 16_777_619;

/// FNV-1a over the canonical key bytes. The result is cached in every
/// entry header, so this function is part of the wire format and must
/// stay stable across versions.
pub(crate) fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A map key: either a raw string, or a composite value canonicalized to
/// JSON text before hashing and storage. The kind tag stored with each
/// entry recovers the original form on iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum MapKey {
    /// A plain string key, stored as its raw bytes.
    Str(String),
    /// A composite key, stored as its canonical JSON text.
    Composite(serde_json::Value),
}

impl MapKey {
    pub(crate) fn kind(&self) -> u16 {
        match self {
            MapKey::Str(_) => KEY_KIND_STRING,
            MapKey::Composite(_) => KEY_KIND_COMPOSITE,
        }
    }

    /// The canonical byte form: raw bytes for strings, JSON text for
    /// composites.
    pub(crate) fn canonical(&self) -> Cow<'_, [u8]> {
        match self {
            MapKey::Str(s) => Cow::Borrowed(s.as_bytes()),
            MapKey::Composite(v) => Cow::Owned(v.to_string().into_bytes()),
        }
    }

    pub(crate) fn from_stored(kind: u16, bytes: &[u8]) -> Result<Self, OrtakError> {
        let text = std::str::from_utf8(bytes).map_err(|e| OrtakError::Codec(Box::new(e)))?;
        match kind {
            KEY_KIND_STRING => Ok(MapKey::Str(text.to_owned())),
            KEY_KIND_COMPOSITE => Ok(MapKey::Composite(serde_json::from_str(text)?)),
            other => Err(OrtakError::codec(format!("unknown key kind {}", other))),
        }
    }

    /// The string payload, when this is a raw string key.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MapKey::Str(s) => Some(s),
            MapKey::Composite(_) => None,
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(s.to_owned())
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::Str(s)
    }
}

impl From<i64> for MapKey {
    fn from(n: i64) -> Self {
        MapKey::Composite(serde_json::Value::from(n))
    }
}

impl From<serde_json::Value> for MapKey {
    fn from(v: serde_json::Value) -> Self {
        MapKey::Composite(v)
    }
}

//! Value encoders: typed value ↔ bytes, selected per entry.
//!
//! Each entry records which encoder produced its payload in a tag field,
//! so a container mixes integers, floats, strings and structural values
//! freely. A user-supplied codec takes precedence over every built-in
//! when configured.
//!
//! Containers never decode from live region bytes: payloads are first
//! copied into a per-view [`Scratch`] buffer, which isolates decoders
//! from concurrent mutation of the underlying memory.

use crate::error::OrtakError;
use crate::value::Value;

/// Encoder identifiers as recorded in entry headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderId {
    /// Built-in number codec (tagged i32 / f64).
    Number,
    /// Built-in UTF-8 string codec.
    Utf8,
    /// Built-in general-purpose structural codec.
    General,
    /// User-supplied codec from the container options.
    User,
}

impl EncoderId {
    /// The wire tag stored in an entry header.
    pub fn as_raw(self) -> u16 {
        match self {
            EncoderId::Number => 0,
            EncoderId::Utf8 => 1,
            EncoderId::General => 2,
            EncoderId::User => 3,
        }
    }

    /// Resolves a stored wire tag.
    pub fn from_raw(raw: u16) -> Result<Self, OrtakError> {
        match raw {
            0 => Ok(EncoderId::Number),
            1 => Ok(EncoderId::Utf8),
            2 => Ok(EncoderId::General),
            3 => Ok(EncoderId::User),
            other => Err(OrtakError::codec(format!("unknown encoder id {}", other))),
        }
    }
}

/// A value codec: byte upper bound, encode into a caller slice, decode
/// from a scratch copy.
pub trait ValueCodec: Send + Sync {
    /// An upper bound on the encoded size of `value`. `encode` may write
    /// fewer bytes, never more.
    fn max_len(&self, value: &Value) -> usize;

    /// Encodes `value` into `dst` (at least `max_len(value)` bytes) and
    /// returns the number of bytes written.
    fn encode(&self, value: &Value, dst: &mut [u8]) -> Result<usize, OrtakError>;

    /// Decodes a value from `src`.
    fn decode(&self, src: &[u8]) -> Result<Value, OrtakError>;
}

/// Number-codec payload tag: signed 32-bit integer follows.
const TAG_INT: u8 = 0;
/// Number-codec payload tag: 64-bit IEEE-754 float follows.
const TAG_FLOAT: u8 = 1;

/// Built-in codec for `Int` and `Float` values: one tag byte followed by
/// the big-endian payload (5 or 9 bytes total).
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberCodec;

impl ValueCodec for NumberCodec {
    fn max_len(&self, value: &Value) -> usize {
        match value {
            Value::Int(_) => 5,
            _ => 9,
        }
    }

    fn encode(&self, value: &Value, dst: &mut [u8]) -> Result<usize, OrtakError> {
        match value {
            Value::Int(v) => {
                dst[0] = TAG_INT;
                dst[1..5].copy_from_slice(&v.to_be_bytes());
                Ok(5)
            }
            Value::Float(v) => {
                dst[0] = TAG_FLOAT;
                dst[1..9].copy_from_slice(&v.to_be_bytes());
                Ok(9)
            }
            other => Err(OrtakError::codec(format!(
                "number codec cannot encode {:?}",
                other
            ))),
        }
    }

    fn decode(&self, src: &[u8]) -> Result<Value, OrtakError> {
        match src.first() {
            Some(&TAG_INT) if src.len() >= 5 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(&src[1..5]);
                Ok(Value::Int(i32::from_be_bytes(buf)))
            }
            Some(&TAG_FLOAT) if src.len() >= 9 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(&src[1..9]);
                Ok(Value::Float(f64::from_be_bytes(buf)))
            }
            _ => Err(OrtakError::codec("malformed number payload")),
        }
    }
}

/// Built-in codec for UTF-8 strings: raw bytes, no tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Codec;

impl ValueCodec for Utf8Codec {
    fn max_len(&self, value: &Value) -> usize {
        match value {
            Value::Str(s) => s.len(),
            _ => 0,
        }
    }

    fn encode(&self, value: &Value, dst: &mut [u8]) -> Result<usize, OrtakError> {
        match value {
            Value::Str(s) => {
                dst[..s.len()].copy_from_slice(s.as_bytes());
                Ok(s.len())
            }
            other => Err(OrtakError::codec(format!(
                "utf-8 codec cannot encode {:?}",
                other
            ))),
        }
    }

    fn decode(&self, src: &[u8]) -> Result<Value, OrtakError> {
        let s = std::str::from_utf8(src).map_err(|e| OrtakError::Codec(Box::new(e)))?;
        Ok(Value::Str(s.to_owned()))
    }
}

/// Built-in general-purpose codec: canonical JSON text of the value's
/// structural form. Total over the whole [`Value`] variant, so it also
/// serves as the fallback for scalars routed through it.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeneralCodec;

impl ValueCodec for GeneralCodec {
    fn max_len(&self, value: &Value) -> usize {
        serde_json::to_vec(&value.to_json()).map(|v| v.len()).unwrap_or(0)
    }

    fn encode(&self, value: &Value, dst: &mut [u8]) -> Result<usize, OrtakError> {
        let bytes = serde_json::to_vec(&value.to_json())?;
        dst[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    fn decode(&self, src: &[u8]) -> Result<Value, OrtakError> {
        Ok(Value::Json(serde_json::from_slice(src)?))
    }
}

static NUMBER: NumberCodec = NumberCodec;
static UTF8: Utf8Codec = Utf8Codec;
static GENERAL: GeneralCodec = GeneralCodec;

/// Picks the encoder for a value at set-time: the user codec when
/// configured, otherwise by runtime variant.
pub fn select<'a>(
    value: &Value,
    user: Option<&'a dyn ValueCodec>,
) -> (EncoderId, &'a dyn ValueCodec) {
    if let Some(codec) = user {
        return (EncoderId::User, codec);
    }
    match value {
        Value::Int(_) | Value::Float(_) => (EncoderId::Number, &NUMBER),
        Value::Str(_) => (EncoderId::Utf8, &UTF8),
        Value::Json(_) => (EncoderId::General, &GENERAL),
    }
}

/// Resolves the decoder for a stored encoder id at read-time.
pub fn for_id<'a>(
    id: EncoderId,
    user: Option<&'a dyn ValueCodec>,
) -> Result<&'a dyn ValueCodec, OrtakError> {
    match id {
        EncoderId::Number => Ok(&NUMBER),
        EncoderId::Utf8 => Ok(&UTF8),
        EncoderId::General => Ok(&GENERAL),
        EncoderId::User => user.ok_or_else(|| {
            OrtakError::codec("entry was written by a user codec but none is configured")
        }),
    }
}

/// Per-view decode buffer, grown to the next power of two on demand.
#[derive(Debug, Default)]
pub struct Scratch {
    buf: Vec<u8>,
}

impl Scratch {
    /// An empty scratch buffer.
    pub fn new() -> Self {
        Scratch::default()
    }

    /// A slice of exactly `len` bytes; contents are whatever the last
    /// use left behind, callers overwrite before reading.
    pub fn grab(&mut self, len: usize) -> &mut [u8] {
        if self.buf.len() < len {
            self.buf.resize(len.next_power_of_two(), 0);
        }
        &mut self.buf[..len]
    }

    /// Current backing capacity.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

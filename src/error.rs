//! Typed errors shared by the region layer and the container crates.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use crate::state::ContainerKind;

/// Errors surfaced by regions, locks, codecs and the containers built on
/// them. Corrupt offsets are deliberately *not* represented here: a region
/// access with nonsense bounds is a programmer bug and panics instead of
/// being silently repaired.
#[derive(Debug)]
pub enum OrtakError {
    /// Memory could not be obtained at any fallback, or a region hit its
    /// virtual reservation ceiling while growing.
    CapacityExhausted {
        /// The byte size that was requested.
        requested: usize,
        /// The reservation the request ran into.
        limit: usize,
    },
    /// The lock could not be acquired before the timeout elapsed. The
    /// operation never started; the caller may retry.
    LockTimeout {
        /// How long the acquisition waited before giving up.
        waited: Duration,
    },
    /// A transferable state was adopted as the wrong container kind.
    KindMismatch {
        /// The kind the adopting constructor expected.
        expected: ContainerKind,
        /// The kind recorded in the envelope.
        found: ContainerKind,
    },
    /// Construction options were rejected.
    InvalidConfig(String),
    /// Reduce of an empty sequence without an initial value.
    EmptyReduce,
    /// An encoder failed; the source error is surfaced unchanged.
    Codec(Box<dyn StdError + Send + Sync>),
}

impl OrtakError {
    /// Builds a codec error from a plain message.
    pub fn codec(msg: impl Into<String>) -> Self {
        OrtakError::Codec(msg.into().into())
    }
}

impl fmt::Display for OrtakError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrtakError::CapacityExhausted { requested, limit } => {
                write!(
                    f,
                    "capacity exhausted: {} bytes requested, reservation is {} bytes",
                    requested, limit
                )
            }
            OrtakError::LockTimeout { waited } => {
                write!(f, "lock acquisition timed out after {:?}", waited)
            }
            OrtakError::KindMismatch { expected, found } => {
                write!(
                    f,
                    "transferable state holds a {} but a {} was expected",
                    found, expected
                )
            }
            OrtakError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            OrtakError::EmptyReduce => {
                write!(f, "reduce of an empty sequence with no initial value")
            }
            OrtakError::Codec(err) => write!(f, "codec error: {}", err),
        }
    }
}

impl StdError for OrtakError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            OrtakError::Codec(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for OrtakError {
    fn from(err: serde_json::Error) -> Self {
        OrtakError::Codec(Box::new(err))
    }
}

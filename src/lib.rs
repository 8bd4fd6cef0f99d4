//! Ortak: shared-memory foundations for shareable containers.
//!
//! Ortak provides the layer the container crates (`ortak-map`,
//! `ortak-array`) are built on: raw byte regions that can be mapped into
//! shared memory and grown in place, a read/write lock whose state is
//! encoded in two atomic words *inside* a region, and a pluggable value
//! codec layer so heterogeneous values can coexist in one container.
//!
//! # Key Features
//!
//! - **Zero-Copy Handoff**: a container is fully described by two regions;
//!   any context holding both reconstructs a live view without copying.
//! - **Region-Resident Locking**: the lock state travels with the data, so
//!   independently constructed views coordinate automatically.
//! - **Stable Addresses**: regions reserve virtual space up front and grow
//!   in place; pages are faulted lazily by the kernel.
//! - **Pluggable Encoding**: numbers, UTF-8 strings, structural JSON and
//!   user-supplied codecs, tagged per entry.
//!
//! # Example
//!
//! ```rust
//! use ortak::{Region, RegionRwLock};
//!
//! // A tiny region with two 4-aligned lock words at offsets 12 and 20.
//! let region = Region::alloc(64, 4096).unwrap();
//! let lock = RegionRwLock::new(region.clone(), 12, 20);
//!
//! {
//!     let _w = lock.write().unwrap();
//!     region.write_u32(0, 42);
//! }
//!
//! let _r = lock.read().unwrap();
//! assert_eq!(region.read_u32(0), 42);
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod error;
mod futex;
pub mod lock;
pub mod region;
pub mod state;
pub mod value;

pub use codec::{EncoderId, GeneralCodec, NumberCodec, Scratch, Utf8Codec, ValueCodec};
pub use error::OrtakError;
pub use lock::{ReadGuard, RegionRwLock, WriteGuard, DEFAULT_LOCK_TIMEOUT};
pub use region::{next_capacity, Region};
pub use state::{ContainerKind, TransferableState};
pub use value::Value;

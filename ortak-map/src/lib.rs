//! Concurrent hash map encoded into two shared-memory regions.
//!
//! The whole map — bucket table, chained entries, variable-length keys
//! and values, encoder tags — lives inside an index region and a data
//! region addressed by byte offsets. Handing both regions to another
//! execution context costs nothing: the receiver adopts them and gets a
//! live view onto the same map, coordinated by the read/write lock
//! embedded in the index header.
//!
//! # Key Features
//!
//! - **Zero-Copy Handoff**: `to_transferable_state` / `from_transferable_state`
//!   share the regions, never their bytes.
//! - **Open-Hash Index**: bucket chains linked through 32-bit data-region
//!   offsets; the table doubles and rehashes at 75% bucket occupancy.
//! - **In-Place Compaction**: deletes leave dead bytes behind; an
//!   overflowing insert compacts the data region instead of growing it
//!   when less than half of it is live.
//! - **Heterogeneous Values**: integers, floats, strings and structural
//!   JSON coexist, each entry tagged with the encoder that wrote it.
//!
//! # Example
//!
//! ```rust
//! use ortak_map::{MapOptions, ShareableMap};
//! use ortak::Value;
//!
//! let map = ShareableMap::new(MapOptions::default()).unwrap();
//! map.set("answer", 42).unwrap();
//! map.set("pi", 3.14).unwrap();
//!
//! assert_eq!(map.get("answer").unwrap(), Some(Value::Int(42)));
//! assert_eq!(map.len().unwrap(), 2);
//!
//! // Hand the map to another context without copying.
//! let state = map.to_transferable_state();
//! let view = ShareableMap::from_transferable_state(state, MapOptions::default()).unwrap();
//! assert_eq!(view.get("pi").unwrap(), Some(Value::Float(3.14)));
//! ```

#![warn(missing_docs)]

mod iter;
mod key;
mod layout;
mod map;

pub use iter::{Iter, Keys, Values};
pub use key::MapKey;
pub use map::{MapOptions, MapStats, ShareableMap};

//! Dense indexed array encoded into two shared-memory regions.
//!
//! Positions live in a slot table of 32-bit words inside the index
//! region; each occupied slot points at a `(encoder, length, payload)`
//! record in the data region. Handing both regions to another execution
//! context costs nothing: the receiver adopts them and observes the same
//! array.
//!
//! Two slot sentinels keep the table self-describing: `0` marks a
//! position that was never written, `1` a position explicitly holding
//! the absent marker; both read as `None`.
//!
//! Ownership contract: the array takes no locks. Mutation requires
//! `&mut self`, so a single view is race-free by construction; views of
//! the same regions must not mutate concurrently from different
//! contexts.
//!
//! # Example
//!
//! ```rust
//! use ortak_array::{ArrayOptions, ShareableArray};
//! use ortak::Value;
//!
//! let mut array = ShareableArray::new(ArrayOptions::default()).unwrap();
//! array.push(Value::from("a")).unwrap();
//! array.push(Value::from("b")).unwrap();
//! array.push(Value::from("c")).unwrap();
//!
//! array.delete(1).unwrap();
//! assert_eq!(array.len(), 2);
//! assert_eq!(array.at(0).unwrap(), Some(Value::from("a")));
//! assert_eq!(array.at(1).unwrap(), Some(Value::from("c")));
//! ```

#![warn(missing_docs)]

mod array;
mod layout;
mod surface;

pub use array::{ArrayOptions, ArrayStats, ShareableArray};
pub use surface::{ArrayIter, Entries};

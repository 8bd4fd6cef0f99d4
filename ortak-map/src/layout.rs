//! Wire layout of the map's index header and entry records.
//!
//! All fields are big-endian through the region's endian-explicit
//! accessors, except the two lock words which are only ever touched as
//! native atomics.

/// Header field: count of live entries.
pub const OFF_SIZE: usize = 0;
/// Header field: count of non-empty buckets.
pub const OFF_BUCKETS_IN_USE: usize = 4;
/// Header field: bump-allocator high-water mark in the data region.
pub const OFF_FREE_START: usize = 8;
/// Header field: lock state word (atomic).
pub const OFF_LOCK_STATE: usize = 12;
/// Header field: live bytes in the data region.
pub const OFF_USED_SPACE: usize = 16;
/// Header field: active reader count (atomic).
pub const OFF_READ_COUNT: usize = 20;
/// Header length; the bucket table begins here.
pub const INDEX_HEADER_LEN: usize = 24;
/// Bytes per bucket word.
pub const BUCKET_LEN: usize = 4;

/// Entry field: chain link, a data-region offset; 0 ends the chain.
pub const ENTRY_NEXT: usize = 0;
/// Entry field: key length in bytes.
pub const ENTRY_KEY_LEN: usize = 4;
/// Entry field: value length in bytes.
pub const ENTRY_VALUE_LEN: usize = 8;
/// Entry field: key kind (u16).
pub const ENTRY_KEY_KIND: usize = 12;
/// Entry field: value encoder id (u16).
pub const ENTRY_ENCODER: usize = 14;
/// Entry field: cached 32-bit key hash.
pub const ENTRY_HASH: usize = 16;
/// Fixed entry header length; key bytes follow, then value bytes.
pub const ENTRY_HEADER_LEN: usize = 20;

/// Offset 0 in the data region is reserved so that 0 can serve as the
/// chain sentinel; the first entry lands here.
pub const INITIAL_DATA_OFFSET: usize = 4;

/// Bucket-occupancy ratio that triggers an index doubling.
pub const LOAD_FACTOR: f64 = 0.75;

/// Key kind tag: canonical text of a composite key.
pub const KEY_KIND_COMPOSITE: u16 = 0;
/// Key kind tag: raw string key.
pub const KEY_KIND_STRING: u16 = 1;

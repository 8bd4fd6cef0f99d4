//! Wire layout of the array's index header, slot table and entry
//! records. All fields are big-endian through the region accessors.

/// Header field: logical element count.
pub const OFF_LENGTH: usize = 0;
/// Header field: bump-allocator high-water mark in the data region.
pub const OFF_FREE_START: usize = 4;
/// Header field: live bytes in the data region.
pub const OFF_USED_SPACE: usize = 8;
/// Header length; the slot table begins here.
pub const INDEX_HEADER_LEN: usize = 12;
/// Bytes per slot word.
pub const SLOT_LEN: usize = 4;

/// Slot sentinel: position never written.
pub const SLOT_UNSET: u32 = 0;
/// Slot sentinel: position explicitly holds the absent marker.
pub const SLOT_ABSENT: u32 = 1;

/// Entry field: value encoder id.
pub const ENTRY_ENCODER: usize = 0;
/// Entry field: value length in bytes.
pub const ENTRY_VALUE_LEN: usize = 4;
/// Fixed entry header length; value bytes follow.
pub const ENTRY_HEADER_LEN: usize = 8;

/// Entries start past the two slot sentinels so a stored offset is never
/// 0 or 1.
pub const INITIAL_DATA_OFFSET: usize = 4;

/// Initial index region: 61 slots after the 12-byte header.
pub const INITIAL_INDEX_LEN: usize = 256;
/// Initial data region.
pub const INITIAL_DATA_LEN: usize = 2048;

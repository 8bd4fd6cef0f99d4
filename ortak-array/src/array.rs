//! The shareable array core.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use ortak::codec::{self, Scratch, ValueCodec};
use ortak::region::{next_capacity, Region};
use ortak::state::{ContainerKind, TransferableState};
use ortak::value::Value;
use ortak::{EncoderId, OrtakError};

use crate::layout::*;

/// Virtual reservation for the index region.
const INDEX_RESERVATION: usize = 256 * 1024 * 1024;
/// Virtual reservation for the data region.
const DATA_RESERVATION: usize = 1024 * 1024 * 1024;
/// Live/total ratio under which an overflowing write compacts instead of
/// growing.
const DEFRAG_RATIO: f64 = 0.5;

/// Construction options for [`ShareableArray`].
#[derive(Clone, Default)]
pub struct ArrayOptions {
    /// User codec applied to every value when present, taking precedence
    /// over the built-in encoders.
    pub serializer: Option<Arc<dyn ValueCodec>>,
}

/// A point-in-time snapshot of the array's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayStats {
    /// Logical element count.
    pub len: usize,
    /// Live bytes in the data region.
    pub used_space: usize,
    /// Bump-allocator high-water mark in the data region.
    pub free_start: usize,
    /// Current logical size of the data region.
    pub data_capacity: usize,
    /// Positions the slot table can hold before growing.
    pub slot_capacity: usize,
}

/// A dense indexed sequence whose entire state lives in two shared byte
/// regions.
///
/// Ownership contract: the array takes no region locks. Mutation requires
/// `&mut self`, so a single view is race-free by construction; views of
/// the same regions obtained through the transferable state must not
/// mutate concurrently from different contexts.
pub struct ShareableArray {
    index: Arc<Region>,
    data: Arc<Region>,
    serializer: Option<Arc<dyn ValueCodec>>,
    scratch: RefCell<Scratch>,
}

impl fmt::Debug for ShareableArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareableArray")
            .field("index", &self.index)
            .field("data", &self.data)
            .finish()
    }
}

impl ShareableArray {
    /// Creates an empty array.
    pub fn new(options: ArrayOptions) -> Result<Self, OrtakError> {
        let index = Region::alloc(INITIAL_INDEX_LEN, INDEX_RESERVATION)?;
        let data = Region::alloc(INITIAL_DATA_LEN, DATA_RESERVATION)?;
        index.write_u32(OFF_FREE_START, INITIAL_DATA_OFFSET as u32);
        Ok(Self::attach(index, data, options.serializer))
    }

    /// Creates an array pre-populated with `items`.
    pub fn with_items(
        options: ArrayOptions,
        items: impl IntoIterator<Item = Option<Value>>,
    ) -> Result<Self, OrtakError> {
        let mut array = Self::new(options)?;
        for item in items {
            array.push(item)?;
        }
        Ok(array)
    }

    /// Adopts the regions of an existing array without copying. Fails
    /// with [`OrtakError::KindMismatch`] when the state describes
    /// another container kind.
    pub fn from_transferable_state(
        state: TransferableState,
        options: ArrayOptions,
    ) -> Result<Self, OrtakError> {
        let (index, data) = state.expect(ContainerKind::Array)?;
        Ok(Self::attach(index, data, options.serializer))
    }

    /// The handle another execution context adopts to observe this
    /// array.
    pub fn to_transferable_state(&self) -> TransferableState {
        TransferableState {
            index: self.index.clone(),
            data: self.data.clone(),
            kind: ContainerKind::Array,
        }
    }

    fn attach(
        index: Arc<Region>,
        data: Arc<Region>,
        serializer: Option<Arc<dyn ValueCodec>>,
    ) -> Self {
        ShareableArray {
            index,
            data,
            serializer,
            scratch: RefCell::new(Scratch::new()),
        }
    }

    /// Logical element count.
    pub fn len(&self) -> usize {
        self.index.read_u32(OFF_LENGTH) as usize
    }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bookkeeping snapshot.
    pub fn stats(&self) -> ArrayStats {
        ArrayStats {
            len: self.len(),
            used_space: self.index.read_u32(OFF_USED_SPACE) as usize,
            free_start: self.index.read_u32(OFF_FREE_START) as usize,
            data_capacity: self.data.len(),
            slot_capacity: self.slot_capacity(),
        }
    }

    /// The element at `index`. Out-of-range positions and positions
    /// holding the absent marker both read as `None`.
    pub fn at(&self, index: usize) -> Result<Option<Value>, OrtakError> {
        if index >= self.len() {
            return Ok(None);
        }
        let slot = self.slot(index);
        if slot <= SLOT_ABSENT {
            return Ok(None);
        }
        self.decode_entry(slot)
    }

    /// Writes `item` at `index`, releasing whatever the position held.
    /// Writing past the end extends the array; the skipped positions
    /// read as absent.
    pub fn set(
        &mut self,
        index: usize,
        item: impl Into<Option<Value>>,
    ) -> Result<(), OrtakError> {
        let item = item.into();
        self.ensure_slots(index + 1)?;
        self.store(index, item.as_ref())?;
        if index >= self.len() {
            self.set_len(index + 1);
        }
        Ok(())
    }

    /// Appends an element and returns the new length.
    pub fn push(&mut self, item: impl Into<Option<Value>>) -> Result<usize, OrtakError> {
        let index = self.len();
        self.set(index, item)?;
        Ok(index + 1)
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Result<Option<Value>, OrtakError> {
        let len = self.len();
        if len == 0 {
            return Ok(None);
        }
        let value = self.at(len - 1)?;
        self.release_slot(len - 1);
        self.set_len(len - 1);
        Ok(value)
    }

    /// Removes and returns the first element, shifting the rest left.
    pub fn shift(&mut self) -> Result<Option<Value>, OrtakError> {
        if self.is_empty() {
            return Ok(None);
        }
        let value = self.at(0)?;
        self.delete(0)?;
        Ok(value)
    }

    /// Prepends an element, shifting the rest right. Returns the new
    /// length.
    pub fn unshift(&mut self, item: impl Into<Option<Value>>) -> Result<usize, OrtakError> {
        self.insert(0, item)?;
        Ok(self.len())
    }

    /// Inserts an element at `index`, shifting later positions right.
    /// Past-the-end indices fall through to [`ShareableArray::set`].
    pub fn insert(
        &mut self,
        index: usize,
        item: impl Into<Option<Value>>,
    ) -> Result<(), OrtakError> {
        let len = self.len();
        if index >= len {
            return self.set(index, item);
        }
        self.ensure_slots(len + 1)?;
        self.index.copy_within(
            Self::slot_offset(index),
            Self::slot_offset(index + 1),
            (len - index) * SLOT_LEN,
        );
        // The moved word still sits at `index`; clear it so the store
        // does not release the entry now owned by `index + 1`.
        self.set_slot(index, SLOT_UNSET);
        self.set_len(len + 1);
        self.store(index, item.into().as_ref())
    }

    /// Removes the element at `index`, shifting later positions left.
    /// Returns whether the index was in range. The entry's bytes stay in
    /// the data region as dead weight until the next defragmentation.
    pub fn delete(&mut self, index: usize) -> Result<bool, OrtakError> {
        let len = self.len();
        if index >= len {
            return Ok(false);
        }
        self.release_slot(index);
        if index + 1 < len {
            self.index.copy_within(
                Self::slot_offset(index + 1),
                Self::slot_offset(index),
                (len - 1 - index) * SLOT_LEN,
            );
        }
        self.set_slot(len - 1, SLOT_UNSET);
        self.set_len(len - 1);
        Ok(true)
    }

    /// Removes `delete_count` elements at `start`, inserts `items` in
    /// their place, and returns the removed elements.
    pub fn splice(
        &mut self,
        start: usize,
        delete_count: usize,
        items: impl IntoIterator<Item = Option<Value>>,
    ) -> Result<Vec<Option<Value>>, OrtakError> {
        let len = self.len();
        let start = start.min(len);
        let removing = delete_count.min(len - start);

        let mut removed = Vec::with_capacity(removing);
        for i in 0..removing {
            removed.push(self.at(start + i)?);
        }
        for _ in 0..removing {
            self.delete(start)?;
        }
        for (offset, item) in items.into_iter().enumerate() {
            self.insert(start + offset, item)?;
        }
        Ok(removed)
    }

    /// Writes `item` into every position of `start..end` (clamped to the
    /// current length).
    pub fn fill(
        &mut self,
        item: impl Into<Option<Value>>,
        start: usize,
        end: usize,
    ) -> Result<(), OrtakError> {
        let len = self.len();
        let item = item.into();
        for index in start.min(len)..end.min(len) {
            self.store(index, item.as_ref())?;
        }
        Ok(())
    }

    /// Reverses the array in place by swapping slot words; entry bytes
    /// never move.
    pub fn reverse(&mut self) {
        let len = self.len();
        let mut left = 0;
        let mut right = len.saturating_sub(1);
        while left < right {
            let a = self.slot(left);
            let b = self.slot(right);
            self.set_slot(left, b);
            self.set_slot(right, a);
            left += 1;
            right -= 1;
        }
    }

    /// Removes every element and resets the allocator.
    pub fn clear(&mut self) {
        self.index
            .fill_zero(INDEX_HEADER_LEN, self.slot_capacity() * SLOT_LEN);
        self.index.write_u32(OFF_LENGTH, 0);
        self.index
            .write_u32(OFF_FREE_START, INITIAL_DATA_OFFSET as u32);
        self.index.write_u32(OFF_USED_SPACE, 0);
    }

    // ---- internals ----

    #[inline]
    fn slot_capacity(&self) -> usize {
        (self.index.len() - INDEX_HEADER_LEN) / SLOT_LEN
    }

    #[inline]
    fn slot_offset(index: usize) -> usize {
        INDEX_HEADER_LEN + index * SLOT_LEN
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> u32 {
        self.index.read_u32(Self::slot_offset(index))
    }

    #[inline]
    fn set_slot(&self, index: usize, value: u32) {
        self.index.write_u32(Self::slot_offset(index), value);
    }

    /// Rewrites a slot word; the in-place sort uses this to permute
    /// positions without touching entry bytes.
    #[inline]
    pub(crate) fn write_slot_word(&mut self, index: usize, word: u32) {
        self.set_slot(index, word);
    }

    fn set_len(&self, len: usize) {
        self.index.write_u32(OFF_LENGTH, len as u32);
    }

    /// Grows the slot table (doubling) until it holds `wanted` slots.
    /// Newly exposed words are zero, i.e. never-written sentinels.
    fn ensure_slots(&self, wanted: usize) -> Result<(), OrtakError> {
        let needed_len = INDEX_HEADER_LEN + wanted * SLOT_LEN;
        if needed_len <= self.index.len() {
            return Ok(());
        }
        self.index
            .grow_to(next_capacity(self.index.len(), needed_len))
    }

    /// Releases the bookkeeping for whatever `index` holds and resets
    /// the slot to never-written.
    fn release_slot(&self, index: usize) {
        if index >= self.slot_capacity() {
            return;
        }
        let slot = self.slot(index);
        if slot > SLOT_ABSENT {
            let value_len = self.data.read_u32(slot as usize + ENTRY_VALUE_LEN);
            let used = self.index.read_u32(OFF_USED_SPACE);
            self.index
                .write_u32(OFF_USED_SPACE, used - (ENTRY_HEADER_LEN as u32 + value_len));
        }
        if slot != SLOT_UNSET {
            self.set_slot(index, SLOT_UNSET);
        }
    }

    /// Encodes `item` into the data region and points the slot at it;
    /// `None` stores the absent sentinel and touches no data bytes.
    fn store(&self, index: usize, item: Option<&Value>) -> Result<(), OrtakError> {
        let Some(value) = item else {
            self.release_slot(index);
            self.set_slot(index, SLOT_ABSENT);
            return Ok(());
        };

        // Encode and reserve space before releasing the old entry, so a
        // failed write leaves the position readable.
        let (encoder, codec) = codec::select(value, self.serializer.as_deref());
        let max_len = codec.max_len(value);
        let mut scratch = self.scratch.borrow_mut();
        let buf = scratch.grab(max_len);
        let written = codec.encode(value, buf)?;
        self.ensure_data_capacity(ENTRY_HEADER_LEN + written)?;
        self.release_slot(index);

        let offset = self.index.read_u32(OFF_FREE_START) as usize;
        self.data
            .write_u32(offset + ENTRY_ENCODER, encoder.as_raw() as u32);
        self.data.write_u32(offset + ENTRY_VALUE_LEN, written as u32);
        self.data.write_bytes(offset + ENTRY_HEADER_LEN, &buf[..written]);

        self.set_slot(index, offset as u32);
        let total = (ENTRY_HEADER_LEN + written) as u32;
        self.index.write_u32(OFF_FREE_START, offset as u32 + total);
        self.index
            .write_u32(OFF_USED_SPACE, self.index.read_u32(OFF_USED_SPACE) + total);
        Ok(())
    }

    fn decode_entry(&self, offset: u32) -> Result<Option<Value>, OrtakError> {
        let raw_id = self.data.read_u32(offset as usize + ENTRY_ENCODER);
        let value_len = self.data.read_u32(offset as usize + ENTRY_VALUE_LEN) as usize;
        let id = EncoderId::from_raw(raw_id as u16)?;
        let codec = codec::for_id(id, self.serializer.as_deref())?;
        let mut scratch = self.scratch.borrow_mut();
        let buf = scratch.grab(value_len);
        self.data.read_bytes(offset as usize + ENTRY_HEADER_LEN, buf);
        Ok(Some(codec.decode(buf)?))
    }

    /// Makes room for `need` more bytes at the high-water mark: compacts
    /// when less than half the region is live and the packed layout
    /// would fit, grows otherwise.
    fn ensure_data_capacity(&self, need: usize) -> Result<(), OrtakError> {
        let free_start = self.index.read_u32(OFF_FREE_START) as usize;
        let capacity = self.data.len();
        if free_start + need <= capacity {
            return Ok(());
        }
        let used = self.index.read_u32(OFF_USED_SPACE) as usize;
        if (used as f64) < capacity as f64 * DEFRAG_RATIO
            && INITIAL_DATA_OFFSET + used + need <= capacity
        {
            self.defragment();
            return Ok(());
        }
        self.data.grow_to(next_capacity(capacity, free_start + need))
    }

    /// Packs live entries contiguously in position order and repoints
    /// the slot table at the new offsets.
    fn defragment(&self) {
        let used = self.index.read_u32(OFF_USED_SPACE) as usize;
        let mut packed = vec![0u8; INITIAL_DATA_OFFSET + used];
        let mut position = INITIAL_DATA_OFFSET;

        for index in 0..self.len() {
            let slot = self.slot(index);
            if slot <= SLOT_ABSENT {
                continue;
            }
            let value_len = self.data.read_u32(slot as usize + ENTRY_VALUE_LEN) as usize;
            let total = ENTRY_HEADER_LEN + value_len;
            self.data
                .read_bytes(slot as usize, &mut packed[position..position + total]);
            self.set_slot(index, position as u32);
            position += total;
        }

        self.data.write_bytes(0, &packed);
        self.index.write_u32(OFF_FREE_START, position as u32);
        debug_assert_eq!(position, INITIAL_DATA_OFFSET + used);
    }
}

//! The shareable map core.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use ortak::codec::{self, Scratch, ValueCodec};
use ortak::lock::RegionRwLock;
use ortak::region::{next_capacity, Region};
use ortak::state::{ContainerKind, TransferableState};
use ortak::value::Value;
use ortak::{EncoderId, OrtakError};

use crate::iter::{Iter, Keys, Values};
use crate::key::{fnv1a, MapKey};
use crate::layout::*;

/// Virtual reservation for the index region.
const INDEX_RESERVATION: usize = 256 * 1024 * 1024;
/// Virtual reservation for the data region.
const DATA_RESERVATION: usize = 1024 * 1024 * 1024;
/// Floor for the initial data region, covering degenerate sizing hints.
const MIN_INITIAL_DATA_LEN: usize = 2048;
/// Floor for the initial bucket count.
const MIN_BUCKET_COUNT: usize = 16;
/// Live/total ratio under which an overflowing insert compacts instead
/// of growing.
const DEFRAG_RATIO: f64 = 0.5;

/// Construction options for [`ShareableMap`].
#[derive(Clone, Default)]
pub struct MapOptions {
    /// Expected number of entries; sizes the initial bucket table and
    /// data region. Defaults to 1024.
    pub expected_size: Option<u32>,
    /// Expected bytes per value; must be a multiple of 4. Defaults
    /// to 256.
    pub average_value_len: Option<u32>,
    /// User codec applied to every value when present, taking precedence
    /// over the built-in encoders.
    pub serializer: Option<Arc<dyn ValueCodec>>,
}

/// A point-in-time snapshot of the map's bookkeeping, taken under the
/// read lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapStats {
    /// Live entry count.
    pub len: usize,
    /// Non-empty buckets.
    pub buckets_in_use: usize,
    /// Total buckets in the index table.
    pub bucket_count: usize,
    /// Live bytes in the data region.
    pub used_space: usize,
    /// Bump-allocator high-water mark in the data region.
    pub free_start: usize,
    /// Current logical size of the data region.
    pub data_capacity: usize,
}

pub(crate) struct EntryHeader {
    pub next: u32,
    pub key_len: u32,
    pub value_len: u32,
    pub key_kind: u16,
    pub encoder: u16,
    pub hash: u32,
}

pub(crate) fn entry_total(header: &EntryHeader) -> u32 {
    ENTRY_HEADER_LEN as u32 + header.key_len + header.value_len
}

struct Found {
    offset: u32,
    prev: u32,
    header: EntryHeader,
}

/// A concurrent hash map whose entire state lives in two shared byte
/// regions.
///
/// Multiple views over the same regions — obtained through
/// [`ShareableMap::to_transferable_state`] — mutate concurrently from
/// different execution contexts, coordinated by the read/write lock
/// embedded in the index region. One view is `Send` but not `Sync`:
/// each context owns its own view.
pub struct ShareableMap {
    index: Arc<Region>,
    data: Arc<Region>,
    lock: RegionRwLock,
    serializer: Option<Arc<dyn ValueCodec>>,
    scratch: RefCell<Scratch>,
}

impl fmt::Debug for ShareableMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareableMap")
            .field("index", &self.index)
            .field("data", &self.data)
            .finish()
    }
}

impl ShareableMap {
    /// Creates an empty map sized from the option hints.
    pub fn new(options: MapOptions) -> Result<Self, OrtakError> {
        let average_value_len = options.average_value_len.unwrap_or(256);
        if average_value_len % 4 != 0 {
            return Err(OrtakError::InvalidConfig(format!(
                "average_value_len must be a multiple of 4, got {}",
                average_value_len
            )));
        }
        let expected_size = options.expected_size.unwrap_or(1024);

        let bucket_count = (expected_size as usize)
            .max(MIN_BUCKET_COUNT)
            .min((INDEX_RESERVATION - INDEX_HEADER_LEN) / BUCKET_LEN);
        let index_len = INDEX_HEADER_LEN + bucket_count * BUCKET_LEN;
        let data_len = (expected_size as usize)
            .saturating_mul(average_value_len as usize)
            .clamp(MIN_INITIAL_DATA_LEN, DATA_RESERVATION);

        let index = Region::alloc(index_len, INDEX_RESERVATION)?;
        let data = Region::alloc(data_len, DATA_RESERVATION)?;
        index.write_u32(OFF_FREE_START, INITIAL_DATA_OFFSET as u32);
        Ok(Self::attach(index, data, options.serializer))
    }

    /// Adopts the regions of an existing map without copying. Fails with
    /// [`OrtakError::KindMismatch`] when the state describes another
    /// container kind.
    pub fn from_transferable_state(
        state: TransferableState,
        options: MapOptions,
    ) -> Result<Self, OrtakError> {
        let (index, data) = state.expect(ContainerKind::Map)?;
        Ok(Self::attach(index, data, options.serializer))
    }

    /// The handle another execution context adopts to observe this map.
    pub fn to_transferable_state(&self) -> TransferableState {
        TransferableState {
            index: self.index.clone(),
            data: self.data.clone(),
            kind: ContainerKind::Map,
        }
    }

    fn attach(
        index: Arc<Region>,
        data: Arc<Region>,
        serializer: Option<Arc<dyn ValueCodec>>,
    ) -> Self {
        let lock = RegionRwLock::new(index.clone(), OFF_LOCK_STATE, OFF_READ_COUNT);
        ShareableMap {
            index,
            data,
            lock,
            serializer,
            scratch: RefCell::new(Scratch::new()),
        }
    }

    /// Looks a key up and decodes its value.
    pub fn get(&self, key: impl Into<MapKey>) -> Result<Option<Value>, OrtakError> {
        let key = key.into();
        let key_bytes = key.canonical();
        let hash = fnv1a(&key_bytes);
        let _guard = self.lock.read()?;
        let mut scratch = self.scratch.borrow_mut();
        let bucket = hash as usize % self.bucket_count();
        match self.find_entry(bucket, hash, &key_bytes, &mut scratch) {
            Some(found) => Ok(Some(self.decode_value(
                &found.header,
                found.offset,
                &mut scratch,
            )?)),
            None => Ok(None),
        }
    }

    /// Whether a key is present; skips the value decode.
    pub fn has(&self, key: impl Into<MapKey>) -> Result<bool, OrtakError> {
        let key = key.into();
        let key_bytes = key.canonical();
        let hash = fnv1a(&key_bytes);
        let _guard = self.lock.read()?;
        let mut scratch = self.scratch.borrow_mut();
        let bucket = hash as usize % self.bucket_count();
        Ok(self.find_entry(bucket, hash, &key_bytes, &mut scratch).is_some())
    }

    /// Inserts or updates an entry, returning `&self` for chaining.
    ///
    /// A value whose encoded upper bound fits the entry's recorded value
    /// length is overwritten in place; otherwise the entry is unlinked
    /// and a fresh one is appended at the allocator high-water mark.
    pub fn set(
        &self,
        key: impl Into<MapKey>,
        value: impl Into<Value>,
    ) -> Result<&Self, OrtakError> {
        let key = key.into();
        let value = value.into();
        let key_bytes = key.canonical();
        let hash = fnv1a(&key_bytes);
        let _guard = self.lock.write()?;
        let mut scratch = self.scratch.borrow_mut();
        let bucket = hash as usize % self.bucket_count();

        if let Some(found) = self.find_entry(bucket, hash, &key_bytes, &mut scratch) {
            let (encoder, codec) = codec::select(&value, self.serializer.as_deref());
            let max_len = codec.max_len(&value);
            if max_len <= found.header.value_len as usize {
                let buf = scratch.grab(max_len);
                let written = codec.encode(&value, buf)?;
                let value_offset =
                    found.offset as usize + ENTRY_HEADER_LEN + found.header.key_len as usize;
                self.data.write_bytes(value_offset, &buf[..written]);
                self.data
                    .write_u32(found.offset as usize + ENTRY_VALUE_LEN, written as u32);
                self.data
                    .write_u16(found.offset as usize + ENTRY_ENCODER, encoder.as_raw());
                let used = self.index.read_u32(OFF_USED_SPACE);
                self.index
                    .write_u32(OFF_USED_SPACE, used - found.header.value_len + written as u32);
                return Ok(self);
            }
            // Encode before unlinking: a failing codec must leave the
            // resident entry intact.
            let buf = scratch.grab(max_len);
            let written = codec.encode(&value, buf)?;
            self.unlink(bucket, &found);
            self.index
                .write_u32(OFF_SIZE, self.index.read_u32(OFF_SIZE) - 1);
            self.index.write_u32(
                OFF_USED_SPACE,
                self.index.read_u32(OFF_USED_SPACE) - entry_total(&found.header),
            );
            self.append_encoded(&key, &key_bytes, hash, encoder, &buf[..written])?;
            return Ok(self);
        }

        self.append_entry(&key, &key_bytes, hash, &value, &mut scratch)?;
        Ok(self)
    }

    /// Inserts only when the key is absent. Returns the resident value
    /// when one already exists.
    pub fn set_if_absent(
        &self,
        key: impl Into<MapKey>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, OrtakError> {
        let key = key.into();
        let value = value.into();
        let key_bytes = key.canonical();
        let hash = fnv1a(&key_bytes);
        let _guard = self.lock.write()?;
        let mut scratch = self.scratch.borrow_mut();
        let bucket = hash as usize % self.bucket_count();

        if let Some(found) = self.find_entry(bucket, hash, &key_bytes, &mut scratch) {
            return Ok(Some(self.decode_value(
                &found.header,
                found.offset,
                &mut scratch,
            )?));
        }
        self.append_entry(&key, &key_bytes, hash, &value, &mut scratch)?;
        Ok(None)
    }

    /// Removes an entry. Returns whether the key existed. The entry's
    /// bytes stay in the data region as dead weight until the next
    /// defragmentation.
    pub fn delete(&self, key: impl Into<MapKey>) -> Result<bool, OrtakError> {
        let key = key.into();
        let key_bytes = key.canonical();
        let hash = fnv1a(&key_bytes);
        let _guard = self.lock.write()?;
        let mut scratch = self.scratch.borrow_mut();
        let bucket = hash as usize % self.bucket_count();
        let Some(found) = self.find_entry(bucket, hash, &key_bytes, &mut scratch) else {
            return Ok(false);
        };
        self.unlink(bucket, &found);
        self.index
            .write_u32(OFF_SIZE, self.index.read_u32(OFF_SIZE) - 1);
        self.index.write_u32(
            OFF_USED_SPACE,
            self.index.read_u32(OFF_USED_SPACE) - entry_total(&found.header),
        );
        Ok(true)
    }

    /// Removes every entry. The bucket table size is retained.
    pub fn clear(&self) -> Result<(), OrtakError> {
        let _guard = self.lock.write()?;
        let bucket_count = self.bucket_count();
        self.index
            .fill_zero(INDEX_HEADER_LEN, bucket_count * BUCKET_LEN);
        self.index.write_u32(OFF_SIZE, 0);
        self.index.write_u32(OFF_BUCKETS_IN_USE, 0);
        self.index
            .write_u32(OFF_FREE_START, INITIAL_DATA_OFFSET as u32);
        self.index.write_u32(OFF_USED_SPACE, 0);
        Ok(())
    }

    /// Live entry count.
    pub fn len(&self) -> Result<usize, OrtakError> {
        let _guard = self.lock.read()?;
        Ok(self.index.read_u32(OFF_SIZE) as usize)
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> Result<bool, OrtakError> {
        Ok(self.len()? == 0)
    }

    /// Bookkeeping snapshot under the read lock.
    pub fn stats(&self) -> Result<MapStats, OrtakError> {
        let _guard = self.lock.read()?;
        Ok(MapStats {
            len: self.index.read_u32(OFF_SIZE) as usize,
            buckets_in_use: self.index.read_u32(OFF_BUCKETS_IN_USE) as usize,
            bucket_count: self.bucket_count(),
            used_space: self.index.read_u32(OFF_USED_SPACE) as usize,
            free_start: self.index.read_u32(OFF_FREE_START) as usize,
            data_capacity: self.data.len(),
        })
    }

    /// Lazy iterator over `(key, value)` pairs. Holds the read lock for
    /// its whole lifetime: treat iteration as one uninterruptible scan.
    pub fn iter(&self) -> Result<Iter<'_>, OrtakError> {
        let guard = self.lock.read()?;
        Ok(Iter::new(self, guard))
    }

    /// Lazy iterator over keys, under the read lock.
    pub fn keys(&self) -> Result<Keys<'_>, OrtakError> {
        Ok(Keys::new(self.iter()?))
    }

    /// Lazy iterator over values, under the read lock.
    pub fn values(&self) -> Result<Values<'_>, OrtakError> {
        Ok(Values::new(self.iter()?))
    }

    /// Runs `f` over every pair in one locked scan.
    pub fn for_each(&self, mut f: impl FnMut(&MapKey, &Value)) -> Result<(), OrtakError> {
        for pair in self.iter()? {
            let (key, value) = pair?;
            f(&key, &value);
        }
        Ok(())
    }

    // ---- internals; callers hold the appropriate lock ----

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        (self.index.len() - INDEX_HEADER_LEN) / BUCKET_LEN
    }

    #[inline]
    pub(crate) fn bucket_head(&self, bucket: usize) -> u32 {
        self.index
            .read_u32(INDEX_HEADER_LEN + bucket * BUCKET_LEN)
    }

    #[inline]
    fn set_bucket_head(&self, bucket: usize, offset: u32) {
        self.index
            .write_u32(INDEX_HEADER_LEN + bucket * BUCKET_LEN, offset);
    }

    fn read_entry(&self, offset: u32) -> EntryHeader {
        let o = offset as usize;
        EntryHeader {
            next: self.data.read_u32(o + ENTRY_NEXT),
            key_len: self.data.read_u32(o + ENTRY_KEY_LEN),
            value_len: self.data.read_u32(o + ENTRY_VALUE_LEN),
            key_kind: self.data.read_u16(o + ENTRY_KEY_KIND),
            encoder: self.data.read_u16(o + ENTRY_ENCODER),
            hash: self.data.read_u32(o + ENTRY_HASH),
        }
    }

    /// Walks a bucket chain for a key: hash equality first, then a
    /// length shortcut, then byte equality on a scratch copy of the
    /// stored key.
    fn find_entry(
        &self,
        bucket: usize,
        hash: u32,
        key_bytes: &[u8],
        scratch: &mut Scratch,
    ) -> Option<Found> {
        let mut prev = 0u32;
        let mut current = self.bucket_head(bucket);
        while current != 0 {
            let header = self.read_entry(current);
            if header.hash == hash && header.key_len as usize == key_bytes.len() {
                let stored = scratch.grab(header.key_len as usize);
                self.data
                    .read_bytes(current as usize + ENTRY_HEADER_LEN, stored);
                if stored == key_bytes {
                    return Some(Found {
                        offset: current,
                        prev,
                        header,
                    });
                }
            }
            prev = current;
            current = header.next;
        }
        None
    }

    fn decode_value(
        &self,
        header: &EntryHeader,
        offset: u32,
        scratch: &mut Scratch,
    ) -> Result<Value, OrtakError> {
        let id = EncoderId::from_raw(header.encoder)?;
        let codec = codec::for_id(id, self.serializer.as_deref())?;
        let buf = scratch.grab(header.value_len as usize);
        self.data.read_bytes(
            offset as usize + ENTRY_HEADER_LEN + header.key_len as usize,
            buf,
        );
        codec.decode(buf)
    }

    pub(crate) fn read_pair_at(&self, offset: u32) -> (u32, Result<(MapKey, Value), OrtakError>) {
        let header = self.read_entry(offset);
        let mut scratch = self.scratch.borrow_mut();
        let key_buf = scratch.grab(header.key_len as usize);
        self.data
            .read_bytes(offset as usize + ENTRY_HEADER_LEN, key_buf);
        let key = MapKey::from_stored(header.key_kind, key_buf);
        let pair = key.and_then(|key| {
            let value = self.decode_value(&header, offset, &mut scratch)?;
            Ok((key, value))
        });
        (header.next, pair)
    }

    /// Splices an entry out of its bucket chain. Counters are the
    /// caller's responsibility.
    fn unlink(&self, bucket: usize, found: &Found) {
        if found.prev == 0 {
            self.set_bucket_head(bucket, found.header.next);
            if found.header.next == 0 {
                self.index.write_u32(
                    OFF_BUCKETS_IN_USE,
                    self.index.read_u32(OFF_BUCKETS_IN_USE) - 1,
                );
            }
        } else {
            self.data
                .write_u32(found.prev as usize + ENTRY_NEXT, found.header.next);
        }
    }

    fn chain_tail(&self, head: u32) -> u32 {
        let mut current = head;
        loop {
            let next = self.data.read_u32(current as usize + ENTRY_NEXT);
            if next == 0 {
                return current;
            }
            current = next;
        }
    }

    /// Encodes `value` into scratch and appends it as a fresh entry.
    fn append_entry(
        &self,
        key: &MapKey,
        key_bytes: &[u8],
        hash: u32,
        value: &Value,
        scratch: &mut Scratch,
    ) -> Result<(), OrtakError> {
        let (encoder, codec) = codec::select(value, self.serializer.as_deref());
        let buf = scratch.grab(codec.max_len(value));
        let written = codec.encode(value, buf)?;
        self.append_encoded(key, key_bytes, hash, encoder, &buf[..written])
    }

    /// Appends a pre-encoded entry at the allocator high-water mark and
    /// links it at its bucket's chain tail, growing or compacting the
    /// data region first when the record would not fit.
    fn append_encoded(
        &self,
        key: &MapKey,
        key_bytes: &[u8],
        hash: u32,
        encoder: EncoderId,
        payload: &[u8],
    ) -> Result<(), OrtakError> {
        self.ensure_data_capacity(ENTRY_HEADER_LEN + key_bytes.len() + payload.len())?;

        let offset = self.index.read_u32(OFF_FREE_START) as usize;
        self.data.write_u32(offset + ENTRY_NEXT, 0);
        self.data
            .write_u32(offset + ENTRY_KEY_LEN, key_bytes.len() as u32);
        self.data
            .write_u32(offset + ENTRY_VALUE_LEN, payload.len() as u32);
        self.data.write_u16(offset + ENTRY_KEY_KIND, key.kind());
        self.data.write_u16(offset + ENTRY_ENCODER, encoder.as_raw());
        self.data.write_u32(offset + ENTRY_HASH, hash);
        self.data.write_bytes(offset + ENTRY_HEADER_LEN, key_bytes);
        self.data
            .write_bytes(offset + ENTRY_HEADER_LEN + key_bytes.len(), payload);

        let bucket = hash as usize % self.bucket_count();
        let head = self.bucket_head(bucket);
        if head == 0 {
            self.set_bucket_head(bucket, offset as u32);
            self.index.write_u32(
                OFF_BUCKETS_IN_USE,
                self.index.read_u32(OFF_BUCKETS_IN_USE) + 1,
            );
        } else {
            let tail = self.chain_tail(head);
            self.data
                .write_u32(tail as usize + ENTRY_NEXT, offset as u32);
        }

        let total = (ENTRY_HEADER_LEN + key_bytes.len() + payload.len()) as u32;
        self.index.write_u32(OFF_FREE_START, offset as u32 + total);
        self.index
            .write_u32(OFF_SIZE, self.index.read_u32(OFF_SIZE) + 1);
        self.index.write_u32(
            OFF_USED_SPACE,
            self.index.read_u32(OFF_USED_SPACE) + total,
        );

        let in_use = self.index.read_u32(OFF_BUCKETS_IN_USE) as f64;
        if in_use >= self.bucket_count() as f64 * LOAD_FACTOR {
            self.double_index()?;
        }
        Ok(())
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

    /// Doubles the bucket table in place and relinks every entry at the
    /// tail of its new chain. The data region's payload bytes are
    /// untouched; only `next` links are rewritten.
    fn double_index(&self) -> Result<(), OrtakError> {
        let old_count = self.bucket_count();
        let new_count = old_count * 2;
        self.index
            .grow_to(INDEX_HEADER_LEN + new_count * BUCKET_LEN)?;

        let mut heads = vec![0u32; new_count];
        let mut tails = vec![0u32; new_count];
        let mut in_use = 0u32;
        for bucket in 0..old_count {
            let mut current = self.bucket_head(bucket);
            while current != 0 {
                let next = self.data.read_u32(current as usize + ENTRY_NEXT);
                let hash = self.data.read_u32(current as usize + ENTRY_HASH);
                let target = hash as usize % new_count;
                if heads[target] == 0 {
                    heads[target] = current;
                    in_use += 1;
                } else {
                    self.data
                        .write_u32(tails[target] as usize + ENTRY_NEXT, current);
                }
                tails[target] = current;
                self.data.write_u32(current as usize + ENTRY_NEXT, 0);
                current = next;
            }
        }

        for (bucket, head) in heads.iter().enumerate() {
            self.set_bucket_head(bucket, *head);
        }
        self.index.write_u32(OFF_BUCKETS_IN_USE, in_use);
        Ok(())
    }

    /// Packs live entries contiguously in bucket-chain order, dropping
    /// the dead bytes left behind by deletes and oversized updates.
    /// Observable contents, `size` and `buckets_in_use` are unchanged.
    fn defragment(&self) {
        let used = self.index.read_u32(OFF_USED_SPACE) as usize;
        let mut packed = vec![0u8; INITIAL_DATA_OFFSET + used];
        let mut position = INITIAL_DATA_OFFSET;

        for bucket in 0..self.bucket_count() {
            let mut current = self.bucket_head(bucket);
            if current == 0 {
                continue;
            }
            self.set_bucket_head(bucket, position as u32);
            while current != 0 {
                let header = self.read_entry(current);
                let total = entry_total(&header) as usize;
                self.data
                    .read_bytes(current as usize, &mut packed[position..position + total]);
                // Chains stay in walk order, so the copied link is either
                // the next packed slot or the chain end.
                let next_position = if header.next != 0 {
                    (position + total) as u32
                } else {
                    0
                };
                packed[position..position + 4].copy_from_slice(&next_position.to_be_bytes());
                position += total;
                current = header.next;
            }
        }

        self.data.write_bytes(0, &packed);
        self.index.write_u32(OFF_FREE_START, position as u32);
        debug_assert_eq!(position, INITIAL_DATA_OFFSET + used);
    }
}

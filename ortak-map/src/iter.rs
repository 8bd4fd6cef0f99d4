//! Lazy iterators over bucket chains, held under the read lock.
//!
//! Every iterator keeps the map's read guard alive for its whole
//! lifetime, so a scan observes one consistent state; callers treat
//! iteration as a single uninterruptible operation.

use ortak::lock::ReadGuard;
use ortak::value::Value;
use ortak::OrtakError;

use crate::key::MapKey;
use crate::map::ShareableMap;

/// Iterator over `(key, value)` pairs in bucket-chain order.
pub struct Iter<'a> {
    map: &'a ShareableMap,
    _guard: ReadGuard<'a>,
    bucket: usize,
    entry: u32,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(map: &'a ShareableMap, guard: ReadGuard<'a>) -> Self {
        Iter {
            map,
            _guard: guard,
            bucket: 0,
            entry: 0,
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = Result<(MapKey, Value), OrtakError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.entry == 0 {
                if self.bucket >= self.map.bucket_count() {
                    return None;
                }
                self.entry = self.map.bucket_head(self.bucket);
                self.bucket += 1;
            } else {
                let (next, pair) = self.map.read_pair_at(self.entry);
                self.entry = next;
                return Some(pair);
            }
        }
    }
}

/// Iterator over keys, under the read lock.
pub struct Keys<'a> {
    inner: Iter<'a>,
}

impl<'a> Keys<'a> {
    pub(crate) fn new(inner: Iter<'a>) -> Self {
        Keys { inner }
    }
}

impl Iterator for Keys<'_> {
    type Item = Result<MapKey, OrtakError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.map(|(key, _)| key))
    }
}

/// Iterator over values, under the read lock.
pub struct Values<'a> {
    inner: Iter<'a>,
}

impl<'a> Values<'a> {
    pub(crate) fn new(inner: Iter<'a>) -> Self {
        Values { inner }
    }
}

impl Iterator for Values<'_> {
    type Item = Result<Value, OrtakError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.inner.next()?.map(|(_, value)| value))
    }
}

//! Read-side combinators and iterators over the array core.
//!
//! Derived, non-mutating combinators materialize into `Vec`s; the
//! mutating ones live on the core in `array.rs`.

use std::cmp::Ordering;
use std::ops::Range;

use ortak::value::Value;
use ortak::OrtakError;

use crate::array::ShareableArray;

/// Default ordering used by [`ShareableArray::sort`]: lexicographic on
/// the elements' text form, absents last.
fn text_order(a: &Option<Value>, b: &Option<Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

impl ShareableArray {
    /// Materializes the whole array.
    pub fn to_vec(&self) -> Result<Vec<Option<Value>>, OrtakError> {
        self.slice(0, self.len())
    }

    /// The elements of `start..end`, clamped to the current length.
    pub fn slice(&self, start: usize, end: usize) -> Result<Vec<Option<Value>>, OrtakError> {
        let len = self.len();
        let start = start.min(len);
        let end = end.min(len).max(start);
        let mut out = Vec::with_capacity(end - start);
        for index in start..end {
            out.push(self.at(index)?);
        }
        Ok(out)
    }

    /// This array's elements followed by `other`'s.
    pub fn concat(&self, other: &ShareableArray) -> Result<Vec<Option<Value>>, OrtakError> {
        let mut out = self.to_vec()?;
        out.extend(other.to_vec()?);
        Ok(out)
    }

    /// A reversed copy; the array itself is untouched.
    pub fn to_reversed(&self) -> Result<Vec<Option<Value>>, OrtakError> {
        let mut out = self.to_vec()?;
        out.reverse();
        Ok(out)
    }

    /// A copy sorted with the default text ordering.
    pub fn to_sorted(&self) -> Result<Vec<Option<Value>>, OrtakError> {
        self.to_sorted_by(text_order)
    }

    /// A copy sorted with `compare`.
    pub fn to_sorted_by(
        &self,
        compare: impl FnMut(&Option<Value>, &Option<Value>) -> Ordering,
    ) -> Result<Vec<Option<Value>>, OrtakError> {
        let mut out = self.to_vec()?;
        out.sort_by(compare);
        Ok(out)
    }

    /// Sorts in place with the default text ordering.
    pub fn sort(&mut self) -> Result<(), OrtakError> {
        self.sort_by(text_order)
    }

    /// Sorts in place with `compare`. Only slot words are permuted;
    /// entry bytes never move.
    pub fn sort_by(
        &mut self,
        mut compare: impl FnMut(&Option<Value>, &Option<Value>) -> Ordering,
    ) -> Result<(), OrtakError> {
        let len = self.len();
        let mut decorated = Vec::with_capacity(len);
        for index in 0..len {
            decorated.push((self.slot(index), self.at(index)?));
        }
        decorated.sort_by(|a, b| compare(&a.1, &b.1));
        for (index, (slot, _)) in decorated.into_iter().enumerate() {
            self.write_slot_word(index, slot);
        }
        Ok(())
    }

    /// Whether any element equals `needle`.
    pub fn includes(&self, needle: impl Into<Option<Value>>) -> Result<bool, OrtakError> {
        Ok(self.index_of(needle)?.is_some())
    }

    /// Position of the first element equal to `needle`.
    pub fn index_of(&self, needle: impl Into<Option<Value>>) -> Result<Option<usize>, OrtakError> {
        let needle = needle.into();
        for index in 0..self.len() {
            if self.at(index)? == needle {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Position of the last element equal to `needle`.
    pub fn last_index_of(
        &self,
        needle: impl Into<Option<Value>>,
    ) -> Result<Option<usize>, OrtakError> {
        let needle = needle.into();
        for index in (0..self.len()).rev() {
            if self.at(index)? == needle {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// First element satisfying `predicate`, flattened: a missing match
    /// and a matching absent element both read as `None`.
    pub fn find(
        &self,
        mut predicate: impl FnMut(&Option<Value>, usize) -> bool,
    ) -> Result<Option<Value>, OrtakError> {
        for index in 0..self.len() {
            let item = self.at(index)?;
            if predicate(&item, index) {
                return Ok(item);
            }
        }
        Ok(None)
    }

    /// Position of the first element satisfying `predicate`.
    pub fn find_index(
        &self,
        mut predicate: impl FnMut(&Option<Value>, usize) -> bool,
    ) -> Result<Option<usize>, OrtakError> {
        for index in 0..self.len() {
            if predicate(&self.at(index)?, index) {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Last element satisfying `predicate`, flattened like
    /// [`ShareableArray::find`].
    pub fn find_last(
        &self,
        mut predicate: impl FnMut(&Option<Value>, usize) -> bool,
    ) -> Result<Option<Value>, OrtakError> {
        for index in (0..self.len()).rev() {
            let item = self.at(index)?;
            if predicate(&item, index) {
                return Ok(item);
            }
        }
        Ok(None)
    }

    /// Position of the last element satisfying `predicate`.
    pub fn find_last_index(
        &self,
        mut predicate: impl FnMut(&Option<Value>, usize) -> bool,
    ) -> Result<Option<usize>, OrtakError> {
        for index in (0..self.len()).rev() {
            if predicate(&self.at(index)?, index) {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Whether `predicate` holds for every element.
    pub fn every(
        &self,
        mut predicate: impl FnMut(&Option<Value>, usize) -> bool,
    ) -> Result<bool, OrtakError> {
        for index in 0..self.len() {
            if !predicate(&self.at(index)?, index) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether `predicate` holds for any element.
    pub fn some(
        &self,
        mut predicate: impl FnMut(&Option<Value>, usize) -> bool,
    ) -> Result<bool, OrtakError> {
        Ok(self.find_index(&mut predicate)?.is_some())
    }

    /// The elements satisfying `predicate`.
    pub fn filter(
        &self,
        mut predicate: impl FnMut(&Option<Value>, usize) -> bool,
    ) -> Result<Vec<Option<Value>>, OrtakError> {
        let mut out = Vec::new();
        for index in 0..self.len() {
            let item = self.at(index)?;
            if predicate(&item, index) {
                out.push(item);
            }
        }
        Ok(out)
    }

    /// Each element mapped through `f`.
    pub fn map_items(
        &self,
        mut f: impl FnMut(&Option<Value>, usize) -> Option<Value>,
    ) -> Result<Vec<Option<Value>>, OrtakError> {
        let mut out = Vec::with_capacity(self.len());
        for index in 0..self.len() {
            out.push(f(&self.at(index)?, index));
        }
        Ok(out)
    }

    /// Each element mapped through `f`, with the produced sequences
    /// flattened one level.
    pub fn flat_map(
        &self,
        mut f: impl FnMut(&Option<Value>, usize) -> Vec<Option<Value>>,
    ) -> Result<Vec<Option<Value>>, OrtakError> {
        let mut out = Vec::new();
        for index in 0..self.len() {
            out.extend(f(&self.at(index)?, index));
        }
        Ok(out)
    }

    /// Left fold with an explicit initial accumulator.
    pub fn fold<T>(
        &self,
        init: T,
        mut f: impl FnMut(T, &Option<Value>, usize) -> T,
    ) -> Result<T, OrtakError> {
        let mut acc = init;
        for index in 0..self.len() {
            let item = self.at(index)?;
            acc = f(acc, &item, index);
        }
        Ok(acc)
    }

    /// Right fold with an explicit initial accumulator.
    pub fn fold_right<T>(
        &self,
        init: T,
        mut f: impl FnMut(T, &Option<Value>, usize) -> T,
    ) -> Result<T, OrtakError> {
        let mut acc = init;
        for index in (0..self.len()).rev() {
            let item = self.at(index)?;
            acc = f(acc, &item, index);
        }
        Ok(acc)
    }

    /// Left reduce seeded with the first element. Fails with
    /// [`OrtakError::EmptyReduce`] on an empty array.
    pub fn reduce(
        &self,
        mut f: impl FnMut(Option<Value>, &Option<Value>, usize) -> Option<Value>,
    ) -> Result<Option<Value>, OrtakError> {
        let len = self.len();
        if len == 0 {
            return Err(OrtakError::EmptyReduce);
        }
        let mut acc = self.at(0)?;
        for index in 1..len {
            let item = self.at(index)?;
            acc = f(acc, &item, index);
        }
        Ok(acc)
    }

    /// Right reduce seeded with the last element. Fails with
    /// [`OrtakError::EmptyReduce`] on an empty array.
    pub fn reduce_right(
        &self,
        mut f: impl FnMut(Option<Value>, &Option<Value>, usize) -> Option<Value>,
    ) -> Result<Option<Value>, OrtakError> {
        let len = self.len();
        if len == 0 {
            return Err(OrtakError::EmptyReduce);
        }
        let mut acc = self.at(len - 1)?;
        for index in (0..len - 1).rev() {
            let item = self.at(index)?;
            acc = f(acc, &item, index);
        }
        Ok(acc)
    }

    /// Runs `f` over every element in order.
    pub fn for_each(
        &self,
        mut f: impl FnMut(&Option<Value>, usize),
    ) -> Result<(), OrtakError> {
        for index in 0..self.len() {
            f(&self.at(index)?, index);
        }
        Ok(())
    }

    /// The elements' text forms joined by `separator`; absent elements
    /// contribute an empty string.
    pub fn join(&self, separator: &str) -> Result<String, OrtakError> {
        let mut out = String::new();
        for index in 0..self.len() {
            if index > 0 {
                out.push_str(separator);
            }
            if let Some(value) = self.at(index)? {
                out.push_str(&value.to_string());
            }
        }
        Ok(out)
    }

    /// Iterator over the elements.
    pub fn iter(&self) -> ArrayIter<'_> {
        ArrayIter {
            array: self,
            position: 0,
            len: self.len(),
        }
    }

    /// Iterator over the elements; alias of [`ShareableArray::iter`].
    pub fn values(&self) -> ArrayIter<'_> {
        self.iter()
    }

    /// The valid positions.
    pub fn keys(&self) -> Range<usize> {
        0..self.len()
    }

    /// Iterator over `(position, element)` pairs.
    pub fn entries(&self) -> Entries<'_> {
        Entries { inner: self.iter() }
    }
}

/// Iterator over elements by ascending position.
pub struct ArrayIter<'a> {
    array: &'a ShareableArray,
    position: usize,
    len: usize,
}

impl Iterator for ArrayIter<'_> {
    type Item = Result<Option<Value>, OrtakError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.len {
            return None;
        }
        let item = self.array.at(self.position);
        self.position += 1;
        Some(item)
    }
}

/// Iterator over `(position, element)` pairs.
pub struct Entries<'a> {
    inner: ArrayIter<'a>,
}

impl Iterator for Entries<'_> {
    type Item = Result<(usize, Option<Value>), OrtakError>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.inner.position;
        let item = self.inner.next()?;
        Some(item.map(|value| (position, value)))
    }
}

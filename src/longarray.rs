//
// Copyright 2025 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Trait definitions for sparse, `i64` indexed containers.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::iter::FusedIterator;
use std::ops::RangeBounds;

/// A sparse, ordered mapping from `i64` indices to values.
///
/// This trait is the contract every locking strategy wraps. Implementations are single threaded;
/// thread safety is layered on top by [`SafeArray`](crate::SafeArray). Only a handful of methods
/// are required, the rest are derived from ordered range iteration and may be overridden by
/// implementations that can do better.
///
/// A stored value is distinguishable from an absent one: lookups return `None` only when the
/// index is not in use. Arrays that need a "null" value should use an `Option` as their value
/// type.
///
/// # Examples
///
/// ```rust
/// use safe_longarray::{LongArray, SparseArray};
///
/// let mut array = SparseArray::new();
/// assert_eq!(array.add("a"), 0);
/// assert_eq!(array.add("b"), 1);
/// assert_eq!(array.set(10, "c"), None);
/// assert_eq!(array.last_index(), Some(10));
/// assert_eq!(array.floor_index(9), Some(1));
/// ```
pub trait LongArray: Clone + Default {
    /// The type of values stored in the array.
    type Value;

    /// Iterator over `(index, value)` pairs in ascending index order.
    type Range<'a>: DoubleEndedIterator<Item = (i64, &'a Self::Value)>
    where
        Self: 'a;

    /// Returns the value stored at `index`, if any.
    fn get(&self, index: i64) -> Option<&Self::Value>;

    /// Stores `value` at `index`, returning the value it replaced.
    fn set(&mut self, index: i64, value: Self::Value) -> Option<Self::Value>;

    /// Removes the value stored at `index`, returning it if the index was in use.
    fn remove(&mut self, index: i64) -> Option<Self::Value>;

    /// Removes every value.
    fn clear(&mut self);

    /// Returns the number of indices in use.
    fn size(&self) -> usize;

    /// Returns the entries whose index falls within `range`, in ascending order.
    fn range<R: RangeBounds<i64>>(&self, range: R) -> Self::Range<'_>;

    /// Returns every entry in ascending order.
    fn iter(&self) -> Self::Range<'_> {
        self.range(..)
    }

    /// Appends `value` one past the last index in use (or at `0` when empty) and returns the
    /// index it was stored at.
    ///
    /// # Panics
    ///
    /// Panics if the last index in use is `i64::MAX`.
    fn add(&mut self, value: Self::Value) -> i64 {
        let index = match self.last_index() {
            Some(last) => last.checked_add(1).expect("long array index space exhausted"),
            None => 0,
        };
        self.set(index, value);
        index
    }

    /// Returns `true` if `index` is in use.
    fn exists(&self, index: i64) -> bool {
        self.get(index).is_some()
    }

    /// Removes every index in the half-open range `[from, to)`.
    fn remove_range(&mut self, from: i64, to: i64) {
        if from >= to {
            return;
        }
        let doomed: Vec<i64> = self.range(from..to).map(|(index, _)| index).collect();
        for index in doomed {
            self.remove(index);
        }
    }

    /// Returns `true` if no index is in use.
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the lowest index in use.
    fn first_index(&self) -> Option<i64> {
        self.iter().next().map(|(index, _)| index)
    }

    /// Returns the highest index in use.
    fn last_index(&self) -> Option<i64> {
        self.iter().next_back().map(|(index, _)| index)
    }

    /// Returns the highest index in use that is less than or equal to `index`.
    fn floor_index(&self, index: i64) -> Option<i64> {
        self.range(..=index).next_back().map(|(index, _)| index)
    }

    /// Returns the value at [`floor_index`](Self::floor_index).
    fn floor(&self, index: i64) -> Option<&Self::Value> {
        self.range(..=index).next_back().map(|(_, value)| value)
    }

    /// Returns the lowest index in use that is greater than or equal to `index`.
    fn ceiling_index(&self, index: i64) -> Option<i64> {
        self.range(index..).next().map(|(index, _)| index)
    }

    /// Returns the value at [`ceiling_index`](Self::ceiling_index).
    fn ceiling(&self, index: i64) -> Option<&Self::Value> {
        self.range(index..).next().map(|(_, value)| value)
    }

    /// Returns `true` if any index holds a value equal to `value`.
    fn contains(&self, value: &Self::Value) -> bool
    where
        Self::Value: PartialEq,
    {
        self.iter().any(|(_, candidate)| candidate == value)
    }

    /// Returns the lowest index holding `value`.
    fn index_of(&self, value: &Self::Value) -> Option<i64>
    where
        Self::Value: PartialEq,
    {
        self.index_of_from(value, i64::MIN)
    }

    /// Returns the lowest index greater than or equal to `from` holding `value`.
    fn index_of_from(&self, value: &Self::Value, from: i64) -> Option<i64>
    where
        Self::Value: PartialEq,
    {
        self.range(from..)
            .find(|(_, candidate)| *candidate == value)
            .map(|(index, _)| index)
    }

    /// Returns the highest index holding `value`.
    fn last_index_of(&self, value: &Self::Value) -> Option<i64>
    where
        Self::Value: PartialEq,
    {
        self.last_index_of_from(value, i64::MAX)
    }

    /// Returns the highest index less than or equal to `from` holding `value`.
    fn last_index_of_from(&self, value: &Self::Value, from: i64) -> Option<i64>
    where
        Self::Value: PartialEq,
    {
        self.range(..=from)
            .rev()
            .find(|(_, candidate)| *candidate == value)
            .map(|(index, _)| index)
    }

    /// Returns every index in use, in ascending order.
    fn keys(&self) -> Vec<i64> {
        self.iter().map(|(index, _)| index).collect()
    }
}

/// Iterator over the entries of an ordered map backed long array.
#[derive(Debug, Clone)]
pub struct Entries<'a, V> {
    inner: btree_map::Range<'a, i64, V>,
}

impl<'a, V> Entries<'a, V> {
    pub(crate) fn new(inner: btree_map::Range<'a, i64, V>) -> Self {
        Self { inner }
    }
}

impl<'a, V> Iterator for Entries<'a, V> {
    type Item = (i64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(&index, value)| (index, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> DoubleEndedIterator for Entries<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(&index, value)| (index, value))
    }
}

impl<V> FusedIterator for Entries<'_, V> {}

// Implementation for BTreeMap<i64, V>
impl<V: Clone> LongArray for BTreeMap<i64, V> {
    type Value = V;
    type Range<'a>
        = Entries<'a, V>
    where
        Self: 'a;

    fn get(&self, index: i64) -> Option<&V> {
        BTreeMap::get(self, &index)
    }

    fn set(&mut self, index: i64, value: V) -> Option<V> {
        self.insert(index, value)
    }

    fn remove(&mut self, index: i64) -> Option<V> {
        BTreeMap::remove(self, &index)
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    fn size(&self) -> usize {
        self.len()
    }

    fn range<R: RangeBounds<i64>>(&self, range: R) -> Entries<'_, V> {
        Entries::new(BTreeMap::range(self, range))
    }
}

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

//! Default single-threaded long array.

use crate::longarray::{Entries, LongArray};
use std::collections::BTreeMap;
use std::ops::RangeBounds;

/// A sparse array of values indexed by `i64`.
///
/// `SparseArray` is the default delegate wrapped by the thread-safe arrays. It stores only the
/// indices in use, in order, so memory is proportional to the number of entries regardless of
/// how far apart their indices are.
///
/// `SparseArray` is not thread safe; wrap it in a [`SafeArray`](crate::SafeArray) to share it.
///
/// # Examples
///
/// ```rust
/// use safe_longarray::{LongArray, SparseArray};
///
/// let mut array: SparseArray<&str> = [(5, "five"), (-3, "minus three")].into_iter().collect();
///
/// assert_eq!(array.first_index(), Some(-3));
/// assert_eq!(array.add("six"), 6);
/// assert_eq!(array.keys(), vec![-3, 5, 6]);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SparseArray<V> {
    entries: BTreeMap<i64, V>,
}

impl<V> SparseArray<V> {
    /// Creates an empty `SparseArray`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safe_longarray::{LongArray, SparseArray};
    ///
    /// let array: SparseArray<u32> = SparseArray::new();
    /// assert!(array.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V> Default for SparseArray<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> LongArray for SparseArray<V> {
    type Value = V;
    type Range<'a>
        = Entries<'a, V>
    where
        Self: 'a;

    fn get(&self, index: i64) -> Option<&V> {
        self.entries.get(&index)
    }

    fn set(&mut self, index: i64, value: V) -> Option<V> {
        self.entries.insert(index, value)
    }

    fn remove(&mut self, index: i64) -> Option<V> {
        self.entries.remove(&index)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn range<R: RangeBounds<i64>>(&self, range: R) -> Entries<'_, V> {
        Entries::new(self.entries.range(range))
    }

    fn exists(&self, index: i64) -> bool {
        self.entries.contains_key(&index)
    }

    fn remove_range(&mut self, from: i64, to: i64) {
        if from >= to {
            return;
        }
        // Cut out [from, to) and splice the tail back on.
        let mut middle = self.entries.split_off(&from);
        let mut tail = middle.split_off(&to);
        self.entries.append(&mut tail);
    }

    fn first_index(&self) -> Option<i64> {
        self.entries.first_key_value().map(|(&index, _)| index)
    }

    fn last_index(&self) -> Option<i64> {
        self.entries.last_key_value().map(|(&index, _)| index)
    }

    fn keys(&self) -> Vec<i64> {
        self.entries.keys().copied().collect()
    }
}

impl<V> FromIterator<(i64, V)> for SparseArray<V> {
    fn from_iter<I: IntoIterator<Item = (i64, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V> Extend<(i64, V)> for SparseArray<V> {
    fn extend<I: IntoIterator<Item = (i64, V)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for SparseArray<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

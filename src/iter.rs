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

//! Snapshot iteration over safe arrays.

use crate::longarray::LongArray;
use crate::result::{SafeArrayError, SafeArrayResult};
use crate::safe::{LockStrategy, ValueOf};
use std::ops::Bound;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Reverse,
}

/// An iterator over a snapshot of a safe array.
///
/// The iterator captures the delegate that is current when it is created and releases the lock
/// straight away. Traversal never blocks and never fails: writes made to the array afterwards
/// are simply not seen. Items are `(index, value)` pairs with the value cloned out of the
/// snapshot.
///
/// The entry most recently returned by `next` can be modified with
/// [`set_value`](Self::set_value) and [`remove`](Self::remove). Each call takes the array's write
/// lock. If the array still holds the snapshot the change is made in place and the iterator
/// keeps walking the modified delegate; if the delegate has been replaced since, the change is
/// applied by index to the current delegate and the iterator keeps walking its old snapshot.
///
/// # Examples
///
/// ```rust
/// use safe_longarray::SafeLongArray;
///
/// let array = SafeLongArray::new();
/// for value in 0..6 {
///     array.add(value);
/// }
///
/// let mut iter = array.iter();
/// while let Some((_, value)) = iter.next() {
///     if value % 2 == 0 {
///         iter.remove().unwrap();
///     }
/// }
/// assert_eq!(array.keys(), vec![1, 3, 5]);
/// ```
pub struct SafeIterator<'a, S: LockStrategy> {
    strategy: &'a S,
    snapshot: Arc<S::Delegate>,
    direction: Direction,
    bound: Bound<i64>,
    current: Option<(i64, ValueOf<S>)>,
}

impl<'a, S: LockStrategy> SafeIterator<'a, S> {
    pub(crate) fn forward(strategy: &'a S, from: Option<i64>) -> Self {
        Self::new(strategy, Direction::Forward, from)
    }

    pub(crate) fn reverse(strategy: &'a S, from: Option<i64>) -> Self {
        Self::new(strategy, Direction::Reverse, from)
    }

    fn new(strategy: &'a S, direction: Direction, from: Option<i64>) -> Self {
        let snapshot = Arc::clone(strategy.acquire_read_lock().resource());
        Self {
            strategy,
            snapshot,
            direction,
            bound: from.map_or(Bound::Unbounded, Bound::Included),
            current: None,
        }
    }

    /// Returns the index of the entry most recently returned by `next`.
    pub fn index(&self) -> Option<i64> {
        self.current.as_ref().map(|(index, _)| *index)
    }

    /// Returns the value of the entry most recently returned by `next`, including any value
    /// written through [`set_value`](Self::set_value).
    pub fn value(&self) -> Option<&ValueOf<S>> {
        self.current.as_ref().map(|(_, value)| value)
    }

    fn mutate<R>(&mut self, f: impl FnOnce(&mut S::Delegate, i64) -> R) -> SafeArrayResult<R> {
        if !self.strategy.supports_iterator_mutation() {
            return Err(SafeArrayError::Unsupported);
        }
        let index = self.index().ok_or(SafeArrayError::IllegalState)?;

        let mut sentry = self.strategy.acquire_write_lock();
        if Arc::ptr_eq(sentry.resource(), &self.snapshot) {
            // Let go of the snapshot so the write lands in place instead of forking it.
            drop(std::mem::take(&mut self.snapshot));
            let result = f(&mut *sentry, index);
            self.snapshot = Arc::clone(sentry.resource());
            Ok(result)
        } else {
            Ok(f(&mut *sentry, index))
        }
    }
}

impl<S> SafeIterator<'_, S>
where
    S: LockStrategy,
    ValueOf<S>: Clone,
{
    /// Replaces the value of the current entry, returning the value the array held there.
    ///
    /// # Errors
    ///
    /// - [`SafeArrayError::IllegalState`] if `next` has not returned an entry yet, or the entry
    ///   was removed.
    /// - [`SafeArrayError::Unsupported`] if the array's iterators are read-only.
    pub fn set_value(&mut self, value: ValueOf<S>) -> SafeArrayResult<Option<ValueOf<S>>> {
        let stored = value.clone();
        let previous = self.mutate(|delegate, index| delegate.set(index, value))?;
        if let Some((_, current)) = &mut self.current {
            *current = stored;
        }
        Ok(previous)
    }

    /// Removes the current entry from the array, returning the value the array held there.
    ///
    /// # Errors
    ///
    /// - [`SafeArrayError::IllegalState`] if `next` has not returned an entry yet, or the entry
    ///   was already removed.
    /// - [`SafeArrayError::Unsupported`] if the array's iterators are read-only.
    pub fn remove(&mut self) -> SafeArrayResult<Option<ValueOf<S>>> {
        let removed = self.mutate(|delegate, index| delegate.remove(index))?;
        self.current = None;
        Ok(removed)
    }
}

impl<S> Iterator for SafeIterator<'_, S>
where
    S: LockStrategy,
    ValueOf<S>: Clone,
{
    type Item = (i64, ValueOf<S>);

    fn next(&mut self) -> Option<Self::Item> {
        let (index, value) = match self.direction {
            Direction::Forward => self.snapshot.range((self.bound, Bound::Unbounded)).next(),
            Direction::Reverse => self
                .snapshot
                .range((Bound::Unbounded, self.bound))
                .next_back(),
        }
        .map(|(index, value)| (index, value.clone()))?;

        self.bound = Bound::Excluded(index);
        self.current = Some((index, value.clone()));
        Some((index, value))
    }
}

impl<S: LockStrategy> std::fmt::Debug for SafeIterator<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeIterator")
            .field("direction", &self.direction)
            .field("bound", &self.bound)
            .field("index", &self.index())
            .finish_non_exhaustive()
    }
}

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

//! Long array operations layered over a pluggable locking strategy.

use crate::iter::SafeIterator;
use crate::longarray::LongArray;
use crate::result::SafeArrayResult;
use crate::sentry::{ReadSentry, WriteSentry};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

/// The value type of the delegate protected by a strategy.
pub type ValueOf<S> = <<S as LockStrategy>::Delegate as LongArray>::Value;

/// The locking half of a safe array.
///
/// A strategy owns exactly one delegate and decides how access to it is synchronized.
/// [`SafeArray`] implements every long array operation in terms of the two acquisition
/// methods, so a strategy only has to hand out sentries.
///
/// Neither sentry type is re-entrant: acquiring a second sentry from the same strategy while
/// one is held on the same thread may deadlock.
pub trait LockStrategy: Sized {
    /// The single-threaded long array being protected.
    type Delegate: LongArray;

    /// Creates a strategy that takes ownership of `delegate`.
    fn with_delegate(delegate: Self::Delegate) -> Self;

    /// Acquires shared access to the delegate, blocking as needed.
    fn acquire_read_lock(&self) -> ReadSentry<'_, Self::Delegate>;

    /// Acquires exclusive access to the current delegate, blocking as needed.
    fn acquire_write_lock(&self) -> WriteSentry<'_, Self::Delegate>;

    /// Acquires shared access, giving up after `timeout`.
    ///
    /// A failed acquisition leaves the strategy unchanged.
    fn try_acquire_read_lock(
        &self,
        timeout: Duration,
    ) -> SafeArrayResult<ReadSentry<'_, Self::Delegate>>;

    /// Acquires exclusive access, giving up after `timeout`.
    ///
    /// A failed acquisition leaves the strategy unchanged.
    fn try_acquire_write_lock(
        &self,
        timeout: Duration,
    ) -> SafeArrayResult<WriteSentry<'_, Self::Delegate>>;

    /// Creates an independent strategy seeded with a copy of the current delegate.
    fn fork(&self) -> Self {
        let sentry = self.acquire_read_lock();
        Self::with_delegate(Self::Delegate::clone(&*sentry))
    }

    /// Returns `true` if iterators may modify the array through `set_value` and `remove`.
    fn supports_iterator_mutation(&self) -> bool {
        true
    }
}

/// A thread-safe long array.
///
/// `SafeArray` wraps a single-threaded [`LongArray`] delegate and makes every operation atomic
/// with respect to every other operation on the same array. How that is achieved is up to the
/// [`LockStrategy`]:
///
/// - [`MutexStrategy`](crate::MutexStrategy) serializes every call;
/// - [`ReadHeavyStrategy`](crate::ReadHeavyStrategy) uses a reader/writer lock and stops locking
///   reads altogether while writes are rare;
/// - [`CopyOnWriteStrategy`](crate::CopyOnWriteStrategy) never locks reads and copies the
///   delegate on every write.
///
/// Values are returned by clone, since no reference into the delegate may outlive the lock
/// protecting it. Use [`read`](Self::read) and [`write`](Self::write) to work with the delegate
/// directly, or to make several calls under one acquisition.
///
/// # Examples
///
/// ```rust
/// use safe_longarray::SafeLongArray;
///
/// let array = SafeLongArray::new();
/// assert_eq!(array.add("a"), 0);
/// assert_eq!(array.add("b"), 1);
/// assert_eq!(array.set(0, "c"), Some("a"));
/// assert_eq!(array.get(0), Some("c"));
/// assert_eq!(array.size(), 2);
/// ```
pub struct SafeArray<S> {
    strategy: S,
}

impl<S: LockStrategy> SafeArray<S> {
    /// Creates an empty `SafeArray` over a default delegate.
    pub fn new() -> Self {
        Self::with_strategy(S::with_delegate(S::Delegate::default()))
    }

    /// Creates a `SafeArray` over a copy of `delegate`.
    ///
    /// The caller keeps its own delegate; later changes to it are not seen by the array.
    pub fn from_delegate(delegate: &S::Delegate) -> Self {
        Self::with_strategy(S::with_delegate(delegate.clone()))
    }

    /// Creates a `SafeArray` that takes ownership of `delegate`.
    pub fn from_owned(delegate: S::Delegate) -> Self {
        Self::with_strategy(S::with_delegate(delegate))
    }

    /// Creates a `SafeArray` from a configured strategy.
    pub fn with_strategy(strategy: S) -> Self {
        Self { strategy }
    }

    /// Returns the locking strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Runs `f` with shared access to the delegate.
    pub fn read<R>(&self, f: impl FnOnce(&S::Delegate) -> R) -> R {
        let sentry = self.strategy.acquire_read_lock();
        f(&*sentry)
    }

    /// Runs `f` with exclusive access to the delegate.
    ///
    /// All changes made by `f` become visible to other threads at once. Under copy-on-write the
    /// delegate is copied and republished even if `f` changes nothing.
    pub fn write<R>(&self, f: impl FnOnce(&mut S::Delegate) -> R) -> R {
        let mut sentry = self.strategy.acquire_write_lock();
        f(&mut *sentry)
    }

    /// Runs `f` with shared access to the delegate, waiting at most `timeout` for it.
    ///
    /// # Errors
    ///
    /// Returns [`SafeArrayError::LockTimeout`](crate::SafeArrayError::LockTimeout) if access
    /// could not be acquired in time; `f` is not run.
    pub fn try_read_for<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&S::Delegate) -> R,
    ) -> SafeArrayResult<R> {
        let sentry = self.strategy.try_acquire_read_lock(timeout)?;
        Ok(f(&*sentry))
    }

    /// Runs `f` with exclusive access to the delegate, waiting at most `timeout` for it.
    ///
    /// # Errors
    ///
    /// Returns [`SafeArrayError::LockTimeout`](crate::SafeArrayError::LockTimeout) if access
    /// could not be acquired in time; `f` is not run and the array is unchanged.
    pub fn try_write_for<R>(
        &self,
        timeout: Duration,
        f: impl FnOnce(&mut S::Delegate) -> R,
    ) -> SafeArrayResult<R> {
        let mut sentry = self.strategy.try_acquire_write_lock(timeout)?;
        Ok(f(&mut *sentry))
    }

    /// Returns a handle to the current delegate.
    ///
    /// The snapshot is immutable and unaffected by later writes to the array.
    pub fn snapshot(&self) -> Arc<S::Delegate> {
        Arc::clone(self.strategy.acquire_read_lock().resource())
    }

    /// Returns `true` if `index` is in use.
    pub fn exists(&self, index: i64) -> bool {
        self.read(|delegate| delegate.exists(index))
    }

    /// Returns the number of indices in use.
    pub fn size(&self) -> usize {
        self.read(LongArray::size)
    }

    /// Returns `true` if no index is in use.
    pub fn is_empty(&self) -> bool {
        self.read(LongArray::is_empty)
    }

    /// Returns the lowest index in use.
    pub fn first_index(&self) -> Option<i64> {
        self.read(LongArray::first_index)
    }

    /// Returns the highest index in use.
    pub fn last_index(&self) -> Option<i64> {
        self.read(LongArray::last_index)
    }

    /// Returns the highest index in use that is less than or equal to `index`.
    pub fn floor_index(&self, index: i64) -> Option<i64> {
        self.read(|delegate| delegate.floor_index(index))
    }

    /// Returns the lowest index in use that is greater than or equal to `index`.
    pub fn ceiling_index(&self, index: i64) -> Option<i64> {
        self.read(|delegate| delegate.ceiling_index(index))
    }

    /// Returns every index in use, in ascending order.
    pub fn keys(&self) -> Vec<i64> {
        self.read(LongArray::keys)
    }

    /// Removes the value at `index`, returning it if the index was in use.
    pub fn remove(&self, index: i64) -> Option<ValueOf<S>> {
        let mut sentry = self.strategy.acquire_write_lock();
        // Mutable access may copy the delegate, so only take it when there is work to do.
        if sentry.exists(index) {
            sentry.remove(index)
        } else {
            None
        }
    }

    /// Removes every index in the half-open range `[from, to)`.
    pub fn remove_range(&self, from: i64, to: i64) {
        let mut sentry = self.strategy.acquire_write_lock();
        if from < to && sentry.range(from..to).next().is_some() {
            sentry.remove_range(from, to);
        }
    }

    /// Removes every value.
    pub fn clear(&self) {
        let mut sentry = self.strategy.acquire_write_lock();
        if !sentry.is_empty() {
            sentry.clear();
        }
    }

    /// Stores `value` at `index`, returning the value it replaced.
    pub fn set(&self, index: i64, value: ValueOf<S>) -> Option<ValueOf<S>> {
        self.write(|delegate| delegate.set(index, value))
    }

    /// Appends `value` after the last index in use and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if the last index in use is `i64::MAX`. The array is left unlocked.
    pub fn add(&self, value: ValueOf<S>) -> i64 {
        self.write(|delegate| delegate.add(value))
    }

    /// Returns an iterator over every entry in ascending index order.
    pub fn iter(&self) -> SafeIterator<'_, S> {
        SafeIterator::forward(&self.strategy, None)
    }

    /// Returns an iterator over the entries at or above `index`, in ascending order.
    pub fn iter_from(&self, index: i64) -> SafeIterator<'_, S> {
        SafeIterator::forward(&self.strategy, Some(index))
    }

    /// Returns an iterator over every entry in descending index order.
    pub fn iter_rev(&self) -> SafeIterator<'_, S> {
        SafeIterator::reverse(&self.strategy, None)
    }

    /// Returns an iterator over the entries at or below `index`, in descending order.
    pub fn iter_rev_from(&self, index: i64) -> SafeIterator<'_, S> {
        SafeIterator::reverse(&self.strategy, Some(index))
    }
}

impl<S> SafeArray<S>
where
    S: LockStrategy,
    ValueOf<S>: Clone,
{
    /// Returns a copy of the value stored at `index`.
    pub fn get(&self, index: i64) -> Option<ValueOf<S>> {
        self.read(|delegate| delegate.get(index).cloned())
    }

    /// Returns a copy of the value at [`floor_index`](Self::floor_index).
    pub fn floor(&self, index: i64) -> Option<ValueOf<S>> {
        self.read(|delegate| delegate.floor(index).cloned())
    }

    /// Returns a copy of the value at [`ceiling_index`](Self::ceiling_index).
    pub fn ceiling(&self, index: i64) -> Option<ValueOf<S>> {
        self.read(|delegate| delegate.ceiling(index).cloned())
    }
}

impl<S> SafeArray<S>
where
    S: LockStrategy,
    ValueOf<S>: PartialEq,
{
    /// Returns `true` if any index holds a value equal to `value`.
    pub fn contains(&self, value: &ValueOf<S>) -> bool {
        self.read(|delegate| delegate.contains(value))
    }

    /// Returns the lowest index holding `value`.
    pub fn index_of(&self, value: &ValueOf<S>) -> Option<i64> {
        self.read(|delegate| delegate.index_of(value))
    }

    /// Returns the lowest index greater than or equal to `from` holding `value`.
    pub fn index_of_from(&self, value: &ValueOf<S>, from: i64) -> Option<i64> {
        self.read(|delegate| delegate.index_of_from(value, from))
    }

    /// Returns the highest index holding `value`.
    pub fn last_index_of(&self, value: &ValueOf<S>) -> Option<i64> {
        self.read(|delegate| delegate.last_index_of(value))
    }

    /// Returns the highest index less than or equal to `from` holding `value`.
    pub fn last_index_of_from(&self, value: &ValueOf<S>, from: i64) -> Option<i64> {
        self.read(|delegate| delegate.last_index_of_from(value, from))
    }
}

impl<S: LockStrategy> Default for SafeArray<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LockStrategy> Clone for SafeArray<S> {
    fn clone(&self) -> Self {
        Self::with_strategy(self.strategy.fork())
    }
}

// Comparisons work on snapshots so that no two locks are ever held at once.
impl<S> PartialEq for SafeArray<S>
where
    S: LockStrategy,
    S::Delegate: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let mine = self.snapshot();
        let theirs = other.snapshot();
        Arc::ptr_eq(&mine, &theirs) || *mine == *theirs
    }
}

impl<S> Eq for SafeArray<S>
where
    S: LockStrategy,
    S::Delegate: Eq,
{
}

impl<S> Hash for SafeArray<S>
where
    S: LockStrategy,
    S::Delegate: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.snapshot().hash(state);
    }
}

impl<S> std::fmt::Debug for SafeArray<S>
where
    S: LockStrategy,
    S::Delegate: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SafeArray").field(&*self.snapshot()).finish()
    }
}

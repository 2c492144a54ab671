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

//! Implementation of copy-on-write access with lock-free reads.

use crate::longarray::LongArray;
use crate::result::{SafeArrayError, SafeArrayResult};
use crate::safe::{LockStrategy, SafeArray};
use crate::sentry::{ReadSentry, WriteSentry};
use crate::sparse::SparseArray;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::time::Duration;

/// A thread-safe [`SparseArray`] whose reads never lock.
pub type CopyOnWriteLongArray<V> = SafeArray<CopyOnWriteStrategy<SparseArray<V>>>;

/// A locking strategy that publishes a fresh copy of the delegate on every write.
///
/// Readers load the published delegate and never block. Writers are serialized by a mutex; the
/// first mutation made through a write sentry clones the published delegate, and the clone
/// replaces it in a single atomic store when the sentry is released. A reader therefore sees
/// either all of a write or none of it.
///
/// Removals that find nothing to remove publish nothing. A [`write`](SafeArray::write) closure
/// always receives mutable access and so always publishes a copy; use
/// [`read`](SafeArray::read) for read-only work.
///
/// Iterators over a copy-on-write array are read-only.
///
/// # Examples
///
/// ```rust
/// use safe_longarray::{CopyOnWriteLongArray, LongArray};
///
/// let array = CopyOnWriteLongArray::new();
/// array.set(0, 'a');
///
/// let before = array.snapshot();
/// array.write(|delegate| {
///     delegate.set(1, 'b');
///     delegate.set(2, 'c');
/// });
/// assert_eq!(before.size(), 1);
/// assert_eq!(array.size(), 3);
/// ```
pub struct CopyOnWriteStrategy<D> {
    current: ArcSwap<D>,
    writer: Mutex<()>,
}

impl<D: LongArray> LockStrategy for CopyOnWriteStrategy<D> {
    type Delegate = D;

    fn with_delegate(delegate: D) -> Self {
        Self {
            current: ArcSwap::from_pointee(delegate),
            writer: Mutex::new(()),
        }
    }

    fn acquire_read_lock(&self) -> ReadSentry<'_, D> {
        ReadSentry::unlocked(self.current.load_full())
    }

    fn acquire_write_lock(&self) -> WriteSentry<'_, D> {
        WriteSentry::copy_on_write(self.writer.lock(), &self.current)
    }

    fn try_acquire_read_lock(&self, _timeout: Duration) -> SafeArrayResult<ReadSentry<'_, D>> {
        Ok(self.acquire_read_lock())
    }

    fn try_acquire_write_lock(&self, timeout: Duration) -> SafeArrayResult<WriteSentry<'_, D>> {
        match self.writer.try_lock_for(timeout) {
            Some(writer) => Ok(WriteSentry::copy_on_write(writer, &self.current)),
            None => {
                tracing::debug!(?timeout, "timed out waiting for copy-on-write writer");
                Err(SafeArrayError::LockTimeout(timeout))
            }
        }
    }

    /// Shares the published delegate; the first write to either side copies it.
    fn fork(&self) -> Self {
        Self {
            current: ArcSwap::new(self.current.load_full()),
            writer: Mutex::new(()),
        }
    }

    fn supports_iterator_mutation(&self) -> bool {
        false
    }
}

impl<D> std::fmt::Debug for CopyOnWriteStrategy<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CopyOnWriteStrategy {{ .. }}")
    }
}

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

//! Implementation of mutually exclusive access to a long array.

use crate::longarray::LongArray;
use crate::result::{SafeArrayError, SafeArrayResult};
use crate::safe::{LockStrategy, SafeArray};
use crate::sentry::{ReadSentry, WriteSentry};
use crate::sparse::SparseArray;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A thread-safe [`SparseArray`] serializing all access through one mutex.
pub type SafeLongArray<V> = SafeArray<MutexStrategy<SparseArray<V>>>;

/// A locking strategy that uses the same mutex for reads and writes.
///
/// Every operation is serialized, readers included. This is the simplest strategy and the
/// cheapest per call; it suits arrays that are written about as often as they are read.
///
/// # Examples
///
/// ```rust
/// use safe_longarray::{MutexStrategy, SafeArray, SparseArray};
///
/// let array: SafeArray<MutexStrategy<SparseArray<u64>>> = SafeArray::new();
/// array.set(7, 49);
/// assert_eq!(array.get(7), Some(49));
/// ```
pub struct MutexStrategy<D> {
    delegate: Mutex<Arc<D>>,
}

impl<D: LongArray> LockStrategy for MutexStrategy<D> {
    type Delegate = D;

    fn with_delegate(delegate: D) -> Self {
        Self {
            delegate: Mutex::new(Arc::new(delegate)),
        }
    }

    fn acquire_read_lock(&self) -> ReadSentry<'_, D> {
        ReadSentry::exclusive(self.delegate.lock())
    }

    fn acquire_write_lock(&self) -> WriteSentry<'_, D> {
        WriteSentry::exclusive(self.delegate.lock())
    }

    fn try_acquire_read_lock(&self, timeout: Duration) -> SafeArrayResult<ReadSentry<'_, D>> {
        self.delegate
            .try_lock_for(timeout)
            .map(ReadSentry::exclusive)
            .ok_or(SafeArrayError::LockTimeout(timeout))
    }

    fn try_acquire_write_lock(&self, timeout: Duration) -> SafeArrayResult<WriteSentry<'_, D>> {
        self.delegate
            .try_lock_for(timeout)
            .map(WriteSentry::exclusive)
            .ok_or(SafeArrayError::LockTimeout(timeout))
    }
}

impl<D> std::fmt::Debug for MutexStrategy<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MutexStrategy {{ .. }}")
    }
}

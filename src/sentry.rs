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

//! Scoped lock guards handing out the current delegate of a safe array.

use arc_swap::ArcSwap;
use parking_lot::{MutexGuard, RwLockReadGuard, RwLockWriteGuard};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A RAII guard providing shared access to the delegate of a safe array.
///
/// The guard is created by [`LockStrategy::acquire_read_lock`](crate::LockStrategy) and holds
/// whatever the strategy needs to keep the delegate stable: a mutex, the read side of a
/// reader/writer lock, or nothing but a handle to an immutable snapshot. Whatever it holds is
/// released exactly once, when the guard is dropped.
///
/// The guard dereferences to the delegate.
pub struct ReadSentry<'a, D> {
    inner: ReadInner<'a, D>,
}

enum ReadInner<'a, D> {
    Exclusive(MutexGuard<'a, Arc<D>>),
    Shared(RwLockReadGuard<'a, Arc<D>>),
    Unlocked(Arc<D>),
}

impl<'a, D> ReadSentry<'a, D> {
    pub(crate) fn exclusive(guard: MutexGuard<'a, Arc<D>>) -> Self {
        Self {
            inner: ReadInner::Exclusive(guard),
        }
    }

    pub(crate) fn shared(guard: RwLockReadGuard<'a, Arc<D>>) -> Self {
        Self {
            inner: ReadInner::Shared(guard),
        }
    }

    /// A sentry over a snapshot nobody will mutate; holding it locks nothing.
    pub(crate) fn unlocked(snapshot: Arc<D>) -> Self {
        Self {
            inner: ReadInner::Unlocked(snapshot),
        }
    }

    /// Returns the handle of the delegate this guard protects.
    ///
    /// The handle is the current one at the time the guard was acquired; cloning it captures a
    /// snapshot that stays valid after the guard is released.
    pub fn resource(&self) -> &Arc<D> {
        match &self.inner {
            ReadInner::Exclusive(guard) => &**guard,
            ReadInner::Shared(guard) => &**guard,
            ReadInner::Unlocked(snapshot) => snapshot,
        }
    }

    /// Returns `true` if this guard holds no lock at all.
    pub fn is_lock_free(&self) -> bool {
        matches!(self.inner, ReadInner::Unlocked(_))
    }
}

impl<D> Deref for ReadSentry<'_, D> {
    type Target = D;
    fn deref(&self) -> &D {
        self.resource().as_ref()
    }
}

impl<D> std::fmt::Debug for ReadSentry<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReadSentry {{ .. }}")
    }
}

/// A RAII guard providing exclusive access to the delegate of a safe array.
///
/// The guard is created by [`LockStrategy::acquire_write_lock`](crate::LockStrategy) and always
/// exposes the true current delegate. Mutable access is copy-on-write: a delegate that is still
/// referenced by a snapshot (an iterator, a lock-free reader) is cloned rather than modified, so
/// snapshots never observe a partial update.
///
/// For copy-on-write arrays the modified clone is published when the guard is dropped. If the
/// guard is dropped while unwinding from a panic nothing is published.
pub struct WriteSentry<'a, D> {
    inner: WriteInner<'a, D>,
}

enum WriteInner<'a, D> {
    Exclusive(MutexGuard<'a, Arc<D>>),
    Upgraded(RwLockWriteGuard<'a, Arc<D>>),
    CopyOnWrite {
        _writer: MutexGuard<'a, ()>,
        published: &'a ArcSwap<D>,
        current: Arc<D>,
        working: Option<D>,
    },
}

impl<'a, D> WriteSentry<'a, D> {
    pub(crate) fn exclusive(guard: MutexGuard<'a, Arc<D>>) -> Self {
        Self {
            inner: WriteInner::Exclusive(guard),
        }
    }

    pub(crate) fn upgraded(guard: RwLockWriteGuard<'a, Arc<D>>) -> Self {
        Self {
            inner: WriteInner::Upgraded(guard),
        }
    }

    /// A sentry that stages changes on a private copy of `published`.
    ///
    /// `writer` must serialize every copy-on-write sentry over the same `published` handle.
    pub(crate) fn copy_on_write(writer: MutexGuard<'a, ()>, published: &'a ArcSwap<D>) -> Self {
        Self {
            inner: WriteInner::CopyOnWrite {
                current: published.load_full(),
                _writer: writer,
                published,
                working: None,
            },
        }
    }

    /// Returns the handle of the current delegate.
    ///
    /// For copy-on-write arrays this is the published delegate the pending changes were copied
    /// from.
    pub fn resource(&self) -> &Arc<D> {
        match &self.inner {
            WriteInner::Exclusive(guard) => &**guard,
            WriteInner::Upgraded(guard) => &**guard,
            WriteInner::CopyOnWrite { current, .. } => current,
        }
    }
}

impl<D> Deref for WriteSentry<'_, D> {
    type Target = D;
    fn deref(&self) -> &D {
        match &self.inner {
            WriteInner::CopyOnWrite {
                working: Some(working),
                ..
            } => working,
            _ => self.resource().as_ref(),
        }
    }
}

impl<D: Clone> DerefMut for WriteSentry<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        match &mut self.inner {
            WriteInner::Exclusive(guard) => Arc::make_mut(&mut **guard),
            WriteInner::Upgraded(guard) => Arc::make_mut(&mut **guard),
            WriteInner::CopyOnWrite {
                current, working, ..
            } => working.get_or_insert_with(|| D::clone(&**current)),
        }
    }
}

impl<D> Drop for WriteSentry<'_, D> {
    fn drop(&mut self) {
        if let WriteInner::CopyOnWrite {
            published, working, ..
        } = &mut self.inner
            && let Some(working) = working.take()
        {
            if std::thread::panicking() {
                tracing::debug!("discarding copy-on-write changes after panic");
            } else {
                published.store(Arc::new(working));
                tracing::trace!("published copy-on-write delegate");
            }
        }
    }
}

impl<D> std::fmt::Debug for WriteSentry<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WriteSentry {{ .. }}")
    }
}

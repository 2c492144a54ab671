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

//! Implementation of a read-write lock that elides read locking under read-heavy load.

use crate::longarray::LongArray;
use crate::result::{SafeArrayError, SafeArrayResult};
use crate::safe::{LockStrategy, SafeArray};
use crate::sentry::{ReadSentry, WriteSentry};
use crate::sparse::SparseArray;
use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A thread-safe [`SparseArray`] optimized for workloads dominated by reads.
pub type ReadHeavyLongArray<V> = SafeArray<ReadHeavyStrategy<SparseArray<V>>>;

/// Reads required per delegate entry before read locking is elided.
pub const CLONE_COST_MULTIPLIER: u64 = 1000;

const NEVER: u64 = u64::MAX;

/// Tuning for [`ReadHeavyStrategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadHeavyConfig {
    /// Reads that must follow a write, per entry in the delegate, before reads stop locking.
    ///
    /// The next write after that point has to clone the delegate, so larger arrays need more
    /// reads to pay for it.
    pub clone_cost_multiplier: u64,
}

impl Default for ReadHeavyConfig {
    fn default() -> Self {
        Self {
            clone_cost_multiplier: CLONE_COST_MULTIPLIER,
        }
    }
}

/// A locking strategy built on a reader/writer lock that promotes itself to lock-free reads.
///
/// Reads start out under the read side of the lock. Every read bumps a counter; once enough
/// reads have happened since the last write, the next reader takes the write lock once and
/// freezes the current delegate as a snapshot. From then on readers use that snapshot without
/// touching the lock at all.
///
/// Writers always take the write lock. If reads are lock-free at that point the frozen delegate
/// may still be in use by readers, so the writer clones it, installs the clone as the new
/// delegate and returns reads to the locked mode. Every write then pushes the promotion point
/// to `reads + size * clone_cost_multiplier`.
///
/// The read counter is deliberately approximate: concurrent readers may lose increments, which
/// only moves the promotion point.
///
/// # Examples
///
/// ```rust
/// use safe_longarray::ReadHeavyLongArray;
///
/// let array = ReadHeavyLongArray::new();
/// array.set(0, "zero");
///
/// for _ in 0..2000 {
///     assert_eq!(array.get(0), Some("zero"));
/// }
/// assert!(array.strategy().is_lock_free());
///
/// array.set(1, "one");
/// assert!(!array.strategy().is_lock_free());
/// ```
pub struct ReadHeavyStrategy<D> {
    delegate: RwLock<Arc<D>>,
    frozen: ArcSwapOption<D>,
    reads: AtomicU64,
    trigger: AtomicU64,
    config: ReadHeavyConfig,
}

impl<D: LongArray> ReadHeavyStrategy<D> {
    /// Creates a strategy over `delegate` with the given tuning.
    pub fn with_config(delegate: D, config: ReadHeavyConfig) -> Self {
        let trigger = cost_of(&delegate, config);
        Self {
            delegate: RwLock::new(Arc::new(delegate)),
            frozen: ArcSwapOption::empty(),
            reads: AtomicU64::new(0),
            trigger: AtomicU64::new(trigger),
            config,
        }
    }

    /// Returns the tuning in effect.
    pub fn config(&self) -> ReadHeavyConfig {
        self.config
    }

    /// Returns `true` if reads currently bypass the lock.
    pub fn is_lock_free(&self) -> bool {
        self.frozen.load().is_some()
    }

    /// Returns the approximate number of reads so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the read count past which reads are promoted, or `None` once they have been.
    pub fn read_trigger(&self) -> Option<u64> {
        match self.trigger.load(Ordering::Relaxed) {
            NEVER => None,
            trigger => Some(trigger),
        }
    }

    /// Counts a read, returning the trigger to promote against if it has been crossed.
    fn count_read(&self) -> Option<u64> {
        // Load and store rather than fetch_add: lost increments are fine here.
        let reads = self.reads.load(Ordering::Relaxed).wrapping_add(1);
        self.reads.store(reads, Ordering::Relaxed);

        let trigger = self.trigger.load(Ordering::Relaxed);
        (reads > trigger).then_some(trigger)
    }

    /// Freezes `current` for lock-free reads. Must be called under the write lock.
    fn promote(&self, current: &Arc<D>, observed: u64) {
        // Another reader may have promoted, or a writer moved the trigger, while we waited.
        if self.trigger.load(Ordering::Relaxed) == observed {
            self.frozen.store(Some(Arc::clone(current)));
            self.trigger.store(NEVER, Ordering::Relaxed);
            tracing::debug!(
                size = current.size(),
                reads = self.read_count(),
                "promoted to lock-free reads"
            );
        }
    }

    /// Prepares `current` for mutation. Must be called under the write lock.
    fn demote(&self, current: &mut Arc<D>) {
        if self.frozen.swap(None).is_some() {
            // Lock-free readers may still be walking the frozen delegate.
            *current = Arc::new(D::clone(&**current));
            tracing::debug!(size = current.size(), "demoted to locked reads");
        }
        let trigger = self
            .read_count()
            .saturating_add(cost_of(&**current, self.config));
        self.trigger.store(trigger, Ordering::Relaxed);
    }
}

fn cost_of<D: LongArray>(delegate: &D, config: ReadHeavyConfig) -> u64 {
    (delegate.size() as u64).saturating_mul(config.clone_cost_multiplier)
}

impl<D: LongArray> LockStrategy for ReadHeavyStrategy<D> {
    type Delegate = D;

    fn with_delegate(delegate: D) -> Self {
        Self::with_config(delegate, ReadHeavyConfig::default())
    }

    fn acquire_read_lock(&self) -> ReadSentry<'_, D> {
        if let Some(observed) = self.count_read() {
            let current = self.delegate.write();
            self.promote(&current, observed);
        }
        match self.frozen.load_full() {
            Some(snapshot) => ReadSentry::unlocked(snapshot),
            None => ReadSentry::shared(self.delegate.read()),
        }
    }

    fn acquire_write_lock(&self) -> WriteSentry<'_, D> {
        let mut current = self.delegate.write();
        self.demote(&mut current);
        WriteSentry::upgraded(current)
    }

    fn try_acquire_read_lock(&self, timeout: Duration) -> SafeArrayResult<ReadSentry<'_, D>> {
        // A deadline past what Instant can represent is no deadline at all.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.acquire_read_lock());
        };
        if let Some(observed) = self.count_read() {
            // Promotion is an optimization; skip it rather than wait past the deadline.
            if let Some(current) = self.delegate.try_write_until(deadline) {
                self.promote(&current, observed);
            }
        }
        match self.frozen.load_full() {
            Some(snapshot) => Ok(ReadSentry::unlocked(snapshot)),
            None => self
                .delegate
                .try_read_until(deadline)
                .map(ReadSentry::shared)
                .ok_or_else(|| {
                    tracing::debug!(?timeout, "timed out waiting for read lock");
                    SafeArrayError::LockTimeout(timeout)
                }),
        }
    }

    fn try_acquire_write_lock(&self, timeout: Duration) -> SafeArrayResult<WriteSentry<'_, D>> {
        let Some(mut current) = self.delegate.try_write_for(timeout) else {
            tracing::debug!(?timeout, "timed out waiting for write lock");
            return Err(SafeArrayError::LockTimeout(timeout));
        };
        self.demote(&mut current);
        Ok(WriteSentry::upgraded(current))
    }

    fn fork(&self) -> Self {
        let sentry = self.acquire_read_lock();
        Self::with_config(D::clone(&*sentry), self.config)
    }
}

impl<D> std::fmt::Debug for ReadHeavyStrategy<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadHeavyStrategy")
            .field("lock_free", &self.frozen.load().is_some())
            .field("reads", &self.reads.load(Ordering::Relaxed))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

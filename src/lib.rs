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

//! # Safe Long Array
//!
//! A Rust library providing thread-safe wrappers around sparse, `i64`-indexed arrays. A long
//! array maps signed 64-bit indices to values; the wrappers make every operation on it atomic
//! and let any number of threads share one array.
//!
//! ## Key Features
//!
//! - **Pluggable Delegates**: Any type implementing [`LongArray`] can be protected; [`SparseArray`]
//!   is provided
//! - **Interchangeable Strategies**: A plain mutex, an adaptive reader/writer lock and a
//!   copy-on-write variant all present the same API through [`SafeArray`]
//! - **Lock-free Reads**: Read-heavy and copy-on-write arrays serve reads without taking a lock
//! - **Snapshot Iterators**: Iterators never block and never fail under concurrent mutation
//! - **RAII Sentries**: Locks are released when the guard goes out of scope, panics included
//! - **Bounded Waits**: `try_read_for` and `try_write_for` give up after a timeout
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use safe_longarray::SafeLongArray;
//!
//! let array = SafeLongArray::new();
//! assert_eq!(array.add("a"), 0);
//! assert_eq!(array.add("b"), 1);
//! assert_eq!(array.set(0, "c"), Some("a"));
//! assert_eq!(array.get(0), Some("c"));
//! assert_eq!(array.size(), 2);
//! ```
//!
//! ### Compound Operations
//!
//! Every method on [`SafeArray`] is atomic on its own. To make several calls atomic together,
//! run them inside [`write`](SafeArray::write):
//!
//! ```rust
//! use safe_longarray::{LongArray, ReadHeavyLongArray};
//!
//! let array = ReadHeavyLongArray::new();
//! array.set(5, 10);
//!
//! let moved = array.write(|delegate| {
//!     let value = delegate.remove(5)?;
//!     delegate.set(6, value);
//!     Some(value)
//! });
//! assert_eq!(moved, Some(10));
//! assert_eq!(array.keys(), vec![6]);
//! ```
//!
//! ### Iterating While Writing
//!
//! ```rust
//! use safe_longarray::CopyOnWriteLongArray;
//!
//! let array = CopyOnWriteLongArray::new();
//! for value in 0..10 {
//!     array.add(value);
//! }
//!
//! let iter = array.iter();
//! array.clear();
//! assert_eq!(iter.count(), 10);
//! assert!(array.is_empty());
//! ```
//!
//! ## Strategies
//!
//! ### SafeLongArray
//!
//! [`MutexStrategy`] serializes all access through one mutex:
//!
//! - Readers and writers exclude each other
//! - Lowest overhead per call
//!
//! ### ReadHeavyLongArray
//!
//! [`ReadHeavyStrategy`] uses a reader/writer lock that adapts to the workload:
//!
//! - Readers share the lock; writers take it exclusively
//! - Once reads outnumber the cost of copying the array, reads stop locking entirely
//! - The next write copies the array and returns reads to the lock
//!
//! ### CopyOnWriteLongArray
//!
//! [`CopyOnWriteStrategy`] never locks reads:
//!
//! - Every write copies the array and publishes the copy atomically
//! - Writers are serialized
//! - Iterators are read-only
//!
//! ## Custom Delegates
//!
//! To protect a custom container, implement the [`LongArray`] trait and wrap it in the strategy
//! of your choice, e.g. `SafeArray<MutexStrategy<MyArray>>`. A `BTreeMap<i64, V>` already
//! implements the trait.
//!
//! ## Error Handling
//!
//! Fallible operations return `SafeArrayResult<T>` which can contain the following errors:
//!
//! - `SafeArrayError::IllegalState`: An iterator was asked to modify an entry it is not on
//! - `SafeArrayError::Unsupported`: An iterator over a copy-on-write array was asked to modify it
//! - `SafeArrayError::LockTimeout`: A bounded wait expired
//!
//! Absent indices are reported as `None`, never as an error.
//!
//! ## Thread Safety
//!
//! All array types implement `Send` and `Sync` when their values do. Sentries are not
//! re-entrant: holding one while calling back into the same array from the same thread may
//! deadlock.
//!
//! ## License
//!
//! Licensed under the Apache License, Version 2.0.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod cow;
#[cfg(test)]
mod harness;
mod iter;
mod longarray;
mod mutex;
mod result;
mod rwlock;
mod safe;
mod sentry;
mod sparse;

pub use self::cow::{CopyOnWriteLongArray, CopyOnWriteStrategy};
pub use self::iter::SafeIterator;
pub use self::longarray::{Entries, LongArray};
pub use self::mutex::{MutexStrategy, SafeLongArray};
pub use self::result::{SafeArrayError, SafeArrayResult};
pub use self::rwlock::{
    CLONE_COST_MULTIPLIER, ReadHeavyConfig, ReadHeavyLongArray, ReadHeavyStrategy,
};
pub use self::safe::{LockStrategy, SafeArray, ValueOf};
pub use self::sentry::{ReadSentry, WriteSentry};
pub use self::sparse::SparseArray;

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

//! Checks shared by the tests of every locking strategy.
//!
//! Each check builds its own array and compares it against a `BTreeMap`, which implements the
//! long array contract without any locking.

use crate::longarray::LongArray;
use crate::result::SafeArrayError;
use crate::safe::{LockStrategy, SafeArray};
use crate::sparse::SparseArray;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread;
use std::time::Duration;

type Reference = BTreeMap<i64, i64>;

/// Scatters `count` pseudo-random indices over `0..max`, duplicates included.
///
/// Draws from a deterministic proptest runner so every run sees the same indices.
fn scattered(count: usize, max: i64) -> Vec<i64> {
    use proptest::strategy::{Strategy as _, ValueTree as _};

    proptest::collection::vec(0..max, count)
        .new_tree(&mut proptest::test_runner::TestRunner::deterministic())
        .expect("index ranges are never rejected")
        .current()
}

fn assert_matches<S>(array: &SafeArray<S>, reference: &Reference, context: &str)
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    assert_eq!(array.size(), LongArray::size(reference), "{context}: size");
    assert_eq!(array.is_empty(), LongArray::is_empty(reference), "{context}: empty");
    assert_eq!(array.first_index(), LongArray::first_index(reference), "{context}: first");
    assert_eq!(array.last_index(), LongArray::last_index(reference), "{context}: last");
    assert_eq!(array.keys(), LongArray::keys(reference), "{context}: keys");
    let entries: Vec<(i64, i64)> = array.iter().collect();
    let expected: Vec<(i64, i64)> = reference.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(entries, expected, "{context}: entries");
}

fn assert_iterates_alike<S>(array: &SafeArray<S>, reference: &Reference, from: i64)
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    let forward: Vec<(i64, i64)> = array.iter_from(from).collect();
    let expected: Vec<(i64, i64)> = reference.range(from..).map(|(k, v)| (*k, *v)).collect();
    assert_eq!(forward, expected, "forward from {from}");

    let reverse: Vec<(i64, i64)> = array.iter_rev_from(from).collect();
    let expected: Vec<(i64, i64)> = reference.range(..=from).rev().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(reverse, expected, "reverse from {from}");
}

/// `add`, `add`, `set`, `get`, `size` on a fresh array.
pub(crate) fn check_scenario<S>()
where
    S: LockStrategy<Delegate = SparseArray<&'static str>>,
{
    let array = SafeArray::<S>::new();
    assert_eq!(array.add("a"), 0);
    assert_eq!(array.add("b"), 1);
    assert_eq!(array.set(0, "c"), Some("a"));
    assert_eq!(array.get(0), Some("c"));
    assert_eq!(array.size(), 2);
}

/// Every read and write agrees with the unlocked reference.
pub(crate) fn check_contract<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    let array = SafeArray::<S>::new();
    let mut reference = Reference::new();
    assert_matches(&array, &reference, "empty");
    assert_eq!(array.get(0), None);
    assert_eq!(array.remove(0), None);

    for index in 0..=39 {
        assert_eq!(array.set(index, index), LongArray::set(&mut reference, index, index));
    }
    assert_matches(&array, &reference, "sequential insertion");

    for index in 10..=19 {
        assert_eq!(array.remove(index), LongArray::remove(&mut reference, index));
    }
    assert_eq!(array.size(), 30);
    assert_matches(&array, &reference, "sequential removal");

    for from in [-1, 0, 10, 25, 39, 40] {
        assert_eq!(array.floor_index(from), LongArray::floor_index(&reference, from));
        assert_eq!(array.floor(from), LongArray::floor(&reference, from).copied());
        assert_eq!(array.ceiling_index(from), LongArray::ceiling_index(&reference, from));
        assert_eq!(array.ceiling(from), LongArray::ceiling(&reference, from).copied());
        assert_iterates_alike(&array, &reference, from);
    }

    array.clear();
    LongArray::clear(&mut reference);
    assert_matches(&array, &reference, "cleared");

    for index in scattered(100, 10_000) {
        assert_eq!(array.set(index, index), LongArray::set(&mut reference, index, index));
    }
    assert_matches(&array, &reference, "scattered insertion");
    for from in [0, 5000, 10_000] {
        assert_iterates_alike(&array, &reference, from);
    }
    assert_eq!(array.add(-1), LongArray::add(&mut reference, -1));

    array.remove_range(2500, 7500);
    LongArray::remove_range(&mut reference, 2500, 7500);
    assert_matches(&array, &reference, "range removal");

    array.clear();
    assert_eq!(array.index_of(&500), None);
    assert_eq!(array.last_index_of(&500), None);
    assert_eq!(array.index_of_from(&500, -1), None);
    assert_eq!(array.last_index_of_from(&500, 1), None);

    for index in 0..=39 {
        array.set(index, index);
    }
    array.set(40, 20);
    array.set(41, 21);
    for index in 42..=49 {
        array.set(index, index);
    }
    assert_eq!(array.size(), 50);
    assert!(array.contains(&21));
    assert!(!array.contains(&500));
    assert_eq!(array.index_of(&20), Some(20));
    assert_eq!(array.index_of_from(&20, -1), Some(20));
    assert_eq!(array.index_of_from(&20, 25), Some(40));
    assert_eq!(array.index_of_from(&21, 41), Some(41));
    assert_eq!(array.index_of_from(&20, 42), None);
    assert_eq!(array.last_index_of(&20), Some(40));
    assert_eq!(array.last_index_of_from(&20, -1), None);
    assert_eq!(array.last_index_of_from(&21, 1), None);
    assert_eq!(array.last_index_of_from(&20, 25), Some(20));
    assert_eq!(array.last_index_of_from(&21, 42), Some(41));
}

fn mutate_through_iterator<S>(array: &SafeArray<S>, reverse: bool, from: i64)
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    let mut iter = if reverse {
        array.iter_rev_from(from)
    } else {
        array.iter_from(from)
    };
    assert_eq!(iter.remove(), Err(SafeArrayError::IllegalState));

    while let Some((index, value)) = iter.next() {
        assert_eq!(iter.index(), Some(index));
        assert_eq!(iter.value(), Some(&value));
        assert_eq!(array.get(index), Some(value));

        if value % 3 == 0 {
            assert_eq!(iter.remove(), Ok(Some(value)));
            assert!(!array.exists(index));
            assert_eq!(array.get(index), None);
            assert!(!array.contains(&value));
            assert_eq!(iter.remove(), Err(SafeArrayError::IllegalState));
        } else {
            assert_eq!(iter.set_value(-value), Ok(Some(value)));
            assert_eq!(iter.value(), Some(&-value));
            assert!(array.exists(index));
            assert!(array.contains(&-value));
            assert_eq!(array.get(index), Some(-value));
        }
    }
}

/// `set_value` and `remove` through forward and reverse iterators.
pub(crate) fn check_iterator_mutation<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    let array = SafeArray::<S>::new();
    let mut reference = Reference::new();
    for index in scattered(100, 10_000) {
        // Zero stays zero when negated, so keep it out of the values.
        let value = index + 1;
        array.set(index, value);
        LongArray::set(&mut reference, index, value);
    }

    for (reverse, from) in [(false, 0), (true, 10_000), (false, 5000), (true, 5000)] {
        mutate_through_iterator(&array, reverse, from);
        let visited: Vec<i64> = if reverse {
            reference.range(..=from).map(|(k, _)| *k).collect()
        } else {
            reference.range(from..).map(|(k, _)| *k).collect()
        };
        for index in visited {
            let value = reference[&index];
            if value % 3 == 0 {
                LongArray::remove(&mut reference, index);
            } else {
                LongArray::set(&mut reference, index, -value);
            }
        }
        assert_matches(&array, &reference, "after iterator mutation");
    }
}

/// Writes to a clone never show through the original, or the other way around.
pub(crate) fn check_clone_independence<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    let original = SafeArray::<S>::new();
    for value in 0..10 {
        original.add(value);
    }
    let copy = original.clone();
    assert!(original == copy);

    copy.set(0, 100);
    copy.remove(9);
    original.set(20, 20);

    assert_eq!(original.get(0), Some(0));
    assert!(original.exists(9));
    assert!(!copy.exists(20));
    assert_eq!(copy.get(0), Some(100));
    assert!(original != copy);
}

/// Concurrent `add` calls never lose an entry or reuse an index.
pub(crate) fn check_no_lost_updates<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>> + Sync,
{
    const THREADS: i64 = 8;
    const ADDS: i64 = 250;

    let array = SafeArray::<S>::new();
    thread::scope(|scope| {
        for worker in 0..THREADS {
            let array = &array;
            scope.spawn(move || {
                for round in 0..ADDS {
                    array.add(worker * ADDS + round);
                }
            });
        }
    });

    assert_eq!(array.size(), (THREADS * ADDS) as usize);
    assert_eq!(array.keys(), (0..THREADS * ADDS).collect::<Vec<_>>());
    let mut values: Vec<i64> = array.iter().map(|(_, value)| value).collect();
    values.sort_unstable();
    assert_eq!(values, (0..THREADS * ADDS).collect::<Vec<_>>());
}

/// An iterator keeps walking its snapshot while another thread clears the array.
pub(crate) fn check_snapshot_iteration<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>> + Sync,
{
    let array = SafeArray::<S>::new();
    for value in 0..100 {
        array.add(value);
    }

    let mut iter = array.iter();
    assert_eq!(iter.next(), Some((0, 0)));
    thread::scope(|scope| {
        scope.spawn(|| array.clear());
    });
    assert!(array.is_empty());

    let rest: Vec<i64> = iter.map(|(index, _)| index).collect();
    assert_eq!(rest, (1..100).collect::<Vec<_>>());
}

/// Readers observe every compound write in full or not at all.
pub(crate) fn check_atomic_writes<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>> + Sync,
{
    const ENTRIES: i64 = 32;
    const GENERATIONS: i64 = 200;

    let array = SafeArray::<S>::new();
    for _ in 0..ENTRIES {
        array.add(0);
    }

    thread::scope(|scope| {
        for _ in 0..2 {
            scope.spawn(|| {
                for _ in 0..500 {
                    let values: Vec<i64> = array.iter().map(|(_, value)| value).collect();
                    assert_eq!(values.len(), ENTRIES as usize);
                    assert!(values.iter().all(|value| *value == values[0]), "{values:?}");

                    array.read(|delegate| {
                        let first = delegate.get(0).copied();
                        assert!(delegate.iter().all(|(_, value)| Some(*value) == first));
                    });
                }
            });
        }
        scope.spawn(|| {
            for generation in 1..=GENERATIONS {
                array.write(|delegate| {
                    for index in 0..ENTRIES {
                        delegate.set(index, generation);
                    }
                });
            }
        });
    });

    assert!(array.iter().all(|(_, value)| value == GENERATIONS));
}

/// Timeouts too large to turn into a deadline wait as long as it takes.
pub(crate) fn check_unbounded_waits<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    let array = SafeArray::<S>::new();
    array.add(7);
    assert_eq!(array.try_read_for(Duration::MAX, |d| d.size()), Ok(1));
    assert_eq!(array.try_write_for(Duration::MAX, |d| d.set(0, 8)), Ok(Some(7)));
    assert_eq!(array.try_read_for(Duration::MAX, |d| d.get(0).copied()), Ok(Some(8)));
}

/// A panic while a write sentry is held releases the lock and keeps the array usable.
pub(crate) fn check_panic_releases_lock<S>()
where
    S: LockStrategy<Delegate = SparseArray<i64>>,
{
    let array = SafeArray::<S>::new();
    array.set(i64::MAX, 1);

    let overflow = catch_unwind(AssertUnwindSafe(|| array.add(2)));
    assert!(overflow.is_err());
    assert_eq!(array.keys(), vec![i64::MAX]);

    let interrupted = catch_unwind(AssertUnwindSafe(|| {
        array.write(|delegate| -> usize {
            delegate.remove(i64::MAX);
            panic!("write interrupted");
        })
    }));
    assert!(interrupted.is_err());

    assert_eq!(array.set(0, 0), None);
    assert_eq!(array.get(0), Some(0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CopyOnWriteStrategy, MutexStrategy, ReadHeavyStrategy};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Set(i64, i64),
        Add(i64),
        Remove(i64),
        RemoveRange(i64, i64),
        Clear,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            6 => (-64i64..64, any::<i64>()).prop_map(|(index, value)| Op::Set(index, value)),
            3 => any::<i64>().prop_map(Op::Add),
            3 => (-64i64..64).prop_map(Op::Remove),
            1 => (-64i64..64, -64i64..64).prop_map(|(from, to)| Op::RemoveRange(from, to)),
            1 => Just(Op::Clear),
        ]
    }

    fn apply<S>(ops: &[Op]) -> Result<(), TestCaseError>
    where
        S: LockStrategy<Delegate = SparseArray<i64>>,
    {
        let array = SafeArray::<S>::new();
        let mut reference = Reference::new();
        for op in ops {
            match *op {
                Op::Set(index, value) => {
                    let previous = LongArray::set(&mut reference, index, value);
                    prop_assert_eq!(array.set(index, value), previous);
                }
                Op::Add(value) => {
                    prop_assert_eq!(array.add(value), LongArray::add(&mut reference, value));
                }
                Op::Remove(index) => {
                    prop_assert_eq!(array.remove(index), LongArray::remove(&mut reference, index));
                }
                Op::RemoveRange(from, to) => {
                    array.remove_range(from, to);
                    LongArray::remove_range(&mut reference, from, to);
                }
                Op::Clear => {
                    array.clear();
                    LongArray::clear(&mut reference);
                }
            }
        }
        let entries: Vec<(i64, i64)> = array.iter().collect();
        let expected: Vec<(i64, i64)> = reference.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(entries, expected);
        prop_assert_eq!(array.first_index(), LongArray::first_index(&reference));
        prop_assert_eq!(array.last_index(), LongArray::last_index(&reference));
        Ok(())
    }

    proptest! {
        #[test]
        fn test_mutex_matches_reference(ops in prop::collection::vec(op(), 0..64)) {
            apply::<MutexStrategy<SparseArray<i64>>>(&ops)?;
        }

        #[test]
        fn test_read_heavy_matches_reference(ops in prop::collection::vec(op(), 0..64)) {
            apply::<ReadHeavyStrategy<SparseArray<i64>>>(&ops)?;
        }

        #[test]
        fn test_copy_on_write_matches_reference(ops in prop::collection::vec(op(), 0..64)) {
            apply::<CopyOnWriteStrategy<SparseArray<i64>>>(&ops)?;
        }
    }

    #[test]
    fn test_scattered_is_repeatable() {
        let first = scattered(50, 100);
        assert_eq!(first, scattered(50, 100));
        assert!(first.iter().all(|index| (0..100).contains(index)));
    }
}

// MIT License
//
// Copyright (c) 2020 Gregory Meyer
//
// Permission is hereby granted, free of charge, to any person
// obtaining a copy of this software and associated documentation files
// (the "Software"), to deal in the Software without restriction,
// including without limitation the rights to use, copy, modify, merge,
// publish, distribute, sublicense, and/or sell copies of the Software,
// and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS
// BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN
// ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use super::*;

use crate::strategy::FnStrategy;

use std::{
    collections::HashSet as StdHashSet,
    sync::{Arc, Barrier},
    thread::{self, JoinHandle},
};

use proptest::prelude::*;

#[test]
fn insertion_and_removal() {
    let set = HashSet::with_num_buckets(4);

    assert!(set.is_empty());

    assert!(set.insert(1));
    assert!(set.insert(2));
    assert!(set.insert(3));

    assert!(!set.is_empty());
    assert_eq!(set.len(), 3);

    assert!(set.remove(&1));
    assert!(set.remove(&2));
    assert!(set.remove(&3));

    assert!(set.is_empty());
    assert_eq!(set.len(), 0);
    assert!(!set.remove(&1));
}

#[test]
fn first_insert_wins() {
    let strategy = FnStrategy::new(
        |s: &String| s.len() as u64,
        |a: &String, b: &String| a.eq_ignore_ascii_case(b),
    );
    let set = HashSet::with_num_buckets_and_strategy(4, strategy);

    assert!(set.insert("Hello".to_string()));
    assert!(!set.insert("hello".to_string()));

    assert_eq!(set.get(&"HELLO".to_string()), Some("Hello".to_string()));
    assert_eq!(set.take(&"hELLO".to_string()), Some("Hello".to_string()));
    assert!(set.is_empty());
}

#[test]
fn strategy_equal_elements_share_a_bucket() {
    let strategy = FnStrategy::new(
        |x: &i32| (x % 10) as u64,
        |a: &i32, b: &i32| a % 10 == b % 10,
    );
    let set = HashSet::with_num_buckets_and_strategy(3, strategy);

    assert_eq!(set.bucket_index(&13), set.bucket_index(&23));
    assert_eq!(set.bucket_index(&13), 0);

    assert!(set.insert(13));
    assert!(!set.insert(23));
    assert!(set.contains(&33));
    assert_eq!(set.len(), 1);
}

#[test]
fn borrowed_lookups() {
    let set = HashSet::new();

    assert!(set.insert("foo".to_string()));
    assert!(set.insert("bar".to_string()));

    assert!(set.contains("foo"));
    assert!(!set.contains("baz"));
    assert_eq!(set.get("bar"), Some("bar".to_string()));
    assert!(set.remove("foo"));
    assert!(!set.contains("foo"));
}

#[test]
fn bulk_operations() {
    let set = HashSet::with_num_buckets(3);

    assert!(set.insert_all(0..10));
    assert!(!set.insert_all(0..10));
    assert!(set.insert_all([9, 10]));
    assert_eq!(set.len(), 11);

    assert!(set.contains_all(&[0, 5, 10]));
    assert!(!set.contains_all(&[0, 11]));
    assert!(set.contains_all(Vec::<i32>::new()));

    assert!(set.remove_all([0, 1, 100]));
    assert!(!set.remove_all([0, 1, 100]));
    assert_eq!(set.len(), 9);
}

#[test]
fn retain_all_keeps_the_intersection() {
    let set = HashSet::with_num_buckets(4);
    set.insert_all(0..100);

    assert!(set.retain_all((50..150).collect::<Vec<_>>()));
    assert_eq!(set.len(), 50);

    let mut remaining = set.to_vec();
    remaining.sort_unstable();
    assert_eq!(remaining, (50..100).collect::<Vec<_>>());

    assert!(!set.retain_all(0..200));
    assert_eq!(set.len(), 50);

    assert!(set.retain_all(Vec::<i32>::new()));
    assert!(set.is_empty());
}

#[test]
fn retain_all_uses_the_set_strategy() {
    let strategy = FnStrategy::new(
        |x: &i32| (x % 10) as u64,
        |a: &i32, b: &i32| a % 10 == b % 10,
    );
    let set = HashSet::with_num_buckets_and_strategy(4, strategy);
    set.insert_all([1, 2, 3]);

    assert!(set.retain_all([11, 13]));

    let mut remaining = set.to_vec();
    remaining.sort_unstable();
    assert_eq!(remaining, vec![1, 3]);
}

#[test]
fn retain() {
    let set: HashSet<i32> = (0..20).collect();

    set.retain(|x| x % 4 == 0);

    let mut remaining: Vec<_> = set.into_iter().collect();
    remaining.sort_unstable();
    assert_eq!(remaining, vec![0, 4, 8, 12, 16]);
}

#[test]
fn iter_is_a_snapshot() {
    let set = HashSet::with_num_buckets(2);
    set.insert_all([1, 2, 3]);

    let snapshot = set.iter();
    set.clear();

    assert!(set.is_empty());
    assert_eq!(snapshot.len(), 3);

    let mut elements: Vec<_> = snapshot.collect();
    elements.sort_unstable();
    assert_eq!(elements, vec![1, 2, 3]);
}

#[test]
fn extend_through_shared_reference() {
    let set = Arc::new(HashSet::with_num_buckets(2));

    let mut shared = &*set;
    shared.extend(vec![1, 2, 2, 3]);

    assert_eq!(set.len(), 3);
    assert_eq!(format!("{:?}", HashSet::<i32>::with_num_buckets(1)), "{}");
}

#[test]
fn concurrent_insertion() {
    const MAX_VALUE: i64 = 512;
    const NUM_THREADS: usize = 64;
    const MAX_INSERTED_VALUE: i64 = (NUM_THREADS as i64) * MAX_VALUE;

    let set: Arc<LongHashSet> = Arc::new(HashSet::with_capacity(MAX_INSERTED_VALUE as usize));
    let barrier = Arc::new(Barrier::new(NUM_THREADS));

    let threads: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let set = set.clone();
            let barrier = barrier.clone();

            thread::spawn(move || {
                barrier.wait();

                for j in (0..MAX_VALUE).map(|j| j + (i as i64 * MAX_VALUE)) {
                    assert!(set.insert(j));
                }
            })
        })
        .collect();

    for result in threads.into_iter().map(JoinHandle::join) {
        assert!(result.is_ok());
    }

    assert_eq!(set.len(), MAX_INSERTED_VALUE as usize);

    for i in 0..MAX_INSERTED_VALUE {
        assert!(set.contains(&i));
    }
}

#[test]
fn concurrent_insertion_of_the_same_elements() {
    const MAX_VALUE: i64 = 512;
    const NUM_THREADS: usize = 16;

    let set: Arc<LongHashSet> = Arc::new(HashSet::with_num_buckets(4));
    let barrier = Arc::new(Barrier::new(NUM_THREADS));

    let threads: Vec<_> = (0..NUM_THREADS)
        .map(|_| {
            let set = set.clone();
            let barrier = barrier.clone();

            thread::spawn(move || {
                barrier.wait();

                (0..MAX_VALUE).filter(|&j| set.insert(j)).count()
            })
        })
        .collect();

    let mut num_inserted = 0;

    for result in threads.into_iter().map(JoinHandle::join) {
        num_inserted += result.unwrap();
    }

    assert_eq!(num_inserted, MAX_VALUE as usize);
    assert_eq!(set.len(), MAX_VALUE as usize);
}

#[test]
fn concurrent_removal_and_len() {
    const MAX_VALUE: i64 = 512;
    const NUM_THREADS: usize = 32;
    const MAX_INSERTED_VALUE: i64 = (NUM_THREADS as i64) * MAX_VALUE;

    let set: Arc<LongHashSet> = Arc::new(HashSet::with_num_buckets(7));
    set.insert_all(0..MAX_INSERTED_VALUE);

    let barrier = Arc::new(Barrier::new(NUM_THREADS + 1));

    let threads: Vec<_> = (0..NUM_THREADS)
        .map(|i| {
            let set = set.clone();
            let barrier = barrier.clone();

            thread::spawn(move || {
                barrier.wait();

                for j in (0..MAX_VALUE).map(|j| j + (i as i64 * MAX_VALUE)) {
                    assert!(set.remove(&j));
                }
            })
        })
        .collect();

    barrier.wait();

    // Whole-set reads may race with removals but must stay in bounds.
    while !set.is_empty() {
        assert!(set.len() <= MAX_INSERTED_VALUE as usize);
        assert!(set.iter().len() <= MAX_INSERTED_VALUE as usize);
    }

    for result in threads.into_iter().map(JoinHandle::join) {
        assert!(result.is_ok());
    }

    assert_eq!(set.len(), 0);
}

proptest! {
    #[test]
    fn len_is_distinct_count(elements in prop::collection::vec(any::<i64>(), 0..256)) {
        let set = HashSet::with_num_buckets(5);

        for &element in &elements {
            set.insert(element);
        }

        let distinct: StdHashSet<_> = elements.iter().copied().collect();
        prop_assert_eq!(set.len(), distinct.len());

        for element in &distinct {
            prop_assert!(set.contains(element));
        }
    }

    #[test]
    fn retain_all_is_intersection(
        elements in prop::collection::vec(0i32..64, 0..128),
        kept in prop::collection::vec(0i32..64, 0..128),
        num_buckets in 1usize..9,
    ) {
        let set = HashSet::with_num_buckets(num_buckets);
        set.insert_all(elements.iter().copied());

        let before: StdHashSet<_> = elements.iter().copied().collect();
        let kept: StdHashSet<_> = kept.into_iter().collect();
        let expected: StdHashSet<_> = before.intersection(&kept).copied().collect();

        let changed = set.retain_all(kept.iter().copied());

        prop_assert_eq!(changed, expected.len() != before.len());
        prop_assert_eq!(set.to_vec().into_iter().collect::<StdHashSet<_>>(), expected);
    }
}

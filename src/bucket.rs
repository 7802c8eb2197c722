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

//! Single-threaded per-bucket storage.
//!
//! A `Bucket` is one shard of a container. It is never shared without its
//! lock; every method here assumes the caller holds the appropriate guard.
//! Hashes are computed by the caller so that routing and probing agree on a
//! single strategy.

use std::mem;

use hashbrown::HashTable;

/// Returns the table size needed to hold `len` elements of `T` without
/// filling past `load_factor`, or `None` if no such table is addressable.
pub(crate) fn raw_capacity<T>(len: usize, load_factor: f32) -> Option<usize> {
    let raw = (len as f64 / load_factor as f64).ceil();
    let max = isize::MAX as usize / mem::size_of::<T>().max(1);

    (raw.is_finite() && raw <= max as f64).then_some(raw as usize)
}

pub(crate) struct Bucket<T> {
    table: HashTable<T>,
    load_factor: f32,
}

impl<T> Bucket<T> {
    /// Creates a bucket that holds at least `capacity` elements before its
    /// fill exceeds `load_factor`.
    ///
    /// The capacity is a hint. If the table cannot be allocated up front, the
    /// bucket starts empty and grows on demand.
    pub(crate) fn with_capacity_and_load_factor(capacity: usize, load_factor: f32) -> Self {
        let mut table = HashTable::new();

        if let Some(raw) = raw_capacity::<T>(capacity, load_factor) {
            // Empty, so the hasher is never called.
            let _ = table.try_reserve(raw, |_: &T| 0);
        }

        Self { table, load_factor }
    }

    pub(crate) fn len(&self) -> usize {
        self.table.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Number of elements this bucket holds before it grows, taking the load
    /// factor into account.
    pub(crate) fn capacity(&self) -> usize {
        (self.table.capacity() as f64 * self.load_factor as f64) as usize
    }

    pub(crate) fn load_factor(&self) -> f32 {
        self.load_factor
    }

    pub(crate) fn find(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        self.table.find(hash, eq)
    }

    pub(crate) fn find_mut(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        self.table.find_mut(hash, eq)
    }

    /// Inserts `value` without checking for an equal element.
    ///
    /// The caller must have already checked that no equal element is present.
    pub(crate) fn insert_unique(&mut self, hash: u64, value: T, hasher: impl Fn(&T) -> u64) {
        self.reserve_one(&hasher);
        self.table.insert_unique(hash, value, hasher);
    }

    pub(crate) fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        self.table
            .find_entry(hash, eq)
            .ok()
            .map(|entry| entry.remove().0)
    }

    /// Removes the matching element only if `condition` accepts it.
    pub(crate) fn remove_if(
        &mut self,
        hash: u64,
        eq: impl FnMut(&T) -> bool,
        condition: impl FnOnce(&T) -> bool,
    ) -> Option<T> {
        let entry = self.table.find_entry(hash, eq).ok()?;

        if condition(entry.get()) {
            Some(entry.remove().0)
        } else {
            None
        }
    }

    /// Keeps only the elements for which `keep` returns true and returns the
    /// number of elements removed.
    pub(crate) fn retain(&mut self, keep: impl FnMut(&mut T) -> bool) -> usize {
        let before = self.table.len();
        self.table.retain(keep);

        before - self.table.len()
    }

    pub(crate) fn clear(&mut self) {
        self.table.clear();
    }

    pub(crate) fn iter(&self) -> hashbrown::hash_table::Iter<'_, T> {
        self.table.iter()
    }

    pub(crate) fn into_elements(self) -> hashbrown::hash_table::IntoIter<T> {
        self.table.into_iter()
    }

    // Grows the table early enough that it never fills past the load factor.
    // When that table is too large to allocate, `insert_unique` grows it by
    // hashbrown's own rule instead.
    fn reserve_one(&mut self, hasher: &impl Fn(&T) -> u64) {
        let needed = self.table.len() + 1;

        if needed <= self.capacity() {
            return;
        }

        if let Some(target) = raw_capacity::<T>(needed, self.load_factor) {
            let additional = target.saturating_sub(self.table.len());
            let _ = self.table.try_reserve(additional, hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(x: &u64) -> u64 {
        *x
    }

    #[test]
    fn insert_find_remove() {
        let mut bucket = Bucket::with_capacity_and_load_factor(4, 0.75);

        for i in 0..64u64 {
            assert!(bucket.find(i, |&x| x == i).is_none());
            bucket.insert_unique(i, i, identity);
            assert_eq!(bucket.find(i, |&x| x == i), Some(&i));
        }

        assert_eq!(bucket.len(), 64);
        assert!(bucket.capacity() >= 64);

        for i in 0..64u64 {
            assert_eq!(bucket.remove(i, |&x| x == i), Some(i));
            assert_eq!(bucket.remove(i, |&x| x == i), None);
        }

        assert!(bucket.is_empty());
    }

    #[test]
    fn initial_capacity_accounts_for_load_factor() {
        let bucket = Bucket::<u64>::with_capacity_and_load_factor(100, 0.25);

        assert!(bucket.capacity() >= 100);
    }

    #[test]
    fn load_factor_bounds_fill() {
        let mut bucket = Bucket::with_capacity_and_load_factor(0, 0.5);

        for i in 0..1000u64 {
            bucket.insert_unique(i, i, identity);

            let raw_capacity = bucket.table.capacity() as f64;
            assert!(bucket.len() as f64 <= raw_capacity * 0.5 + 1.0);
        }
    }

    #[test]
    fn raw_capacity_rejects_unaddressable_tables() {
        assert_eq!(raw_capacity::<u64>(3, 0.75), Some(4));
        assert_eq!(raw_capacity::<u64>(0, 1e-30), Some(0));
        assert_eq!(raw_capacity::<u64>(16, 1e-30), None);
        assert_eq!(raw_capacity::<u64>(usize::MAX, 0.75), None);
    }

    #[test]
    fn tiny_load_factor_still_grows() {
        let mut bucket = Bucket::with_capacity_and_load_factor(usize::MAX, 1e-15);

        for i in 0..256u64 {
            bucket.insert_unique(i, i, identity);
        }

        assert_eq!(bucket.len(), 256);

        for i in 0..256u64 {
            assert_eq!(bucket.find(i, |&x| x == i), Some(&i));
        }
    }

    #[test]
    fn remove_if_respects_condition() {
        let mut bucket = Bucket::with_capacity_and_load_factor(8, 1.0);
        bucket.insert_unique(3, 3u64, identity);

        assert_eq!(bucket.remove_if(3, |&x| x == 3, |&x| x > 5), None);
        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.remove_if(3, |&x| x == 3, |&x| x < 5), Some(3));
        assert!(bucket.is_empty());
    }

    #[test]
    fn retain_counts_removed() {
        let mut bucket = Bucket::with_capacity_and_load_factor(16, 0.75);

        for i in 0..10u64 {
            bucket.insert_unique(i, i, identity);
        }

        assert_eq!(bucket.retain(|x| *x % 2 == 0), 5);
        assert_eq!(bucket.len(), 5);
        assert!(bucket.iter().all(|x| x % 2 == 0));
    }
}

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

//! A lock-striped concurrent hash set.

use crate::{
    bucket::Bucket,
    config::{DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR},
    router::{self, Layout, Router},
    snapshot::{IntoIter, Snapshot},
    strategy::{HashStrategy, Natural},
};

use std::{borrow::Borrow, fmt, hash::Hash};

/// A concurrent hash set split into independently locked buckets.
///
/// Elements are routed to buckets and compared exactly like the keys of a
/// [`HashMap`], through the strategy `H`, and the same locking rules apply:
/// single-element operations lock one bucket, whole-set operations visit the
/// buckets one at a time and so do not see the set at a single instant.
///
/// When an element equal to one already stored is inserted, the stored
/// element is kept and [`insert`] returns false.
///
/// ```
/// use lockstripe::HashSet;
///
/// let set = HashSet::with_num_buckets(4);
///
/// assert!(set.insert(1));
/// assert!(set.insert(2));
/// assert!(!set.insert(1));
/// assert_eq!(set.len(), 2);
///
/// assert!(set.remove(&1));
/// assert!(!set.contains(&1));
/// ```
///
/// [`HashMap`]: crate::HashMap
/// [`insert`]: #method.insert
pub struct HashSet<T, H = Natural> {
    router: Router<T>,
    strategy: H,
}

/// A set of `i64`s.
pub type LongHashSet = HashSet<i64>;

impl<T> HashSet<T, Natural> {
    /// Creates an empty `HashSet` with [`default_num_buckets`] buckets and
    /// room for [`DEFAULT_INITIAL_CAPACITY`] elements.
    ///
    /// [`default_num_buckets`]: crate::default_num_buckets
    /// [`DEFAULT_INITIAL_CAPACITY`]: crate::DEFAULT_INITIAL_CAPACITY
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Creates an empty `HashSet` with [`default_num_buckets`] buckets and
    /// room for at least `capacity` evenly spread elements.
    ///
    /// [`default_num_buckets`]: crate::default_num_buckets
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_num_buckets_and_capacity(router::default_num_buckets(), capacity)
    }

    /// Creates an empty `HashSet` with exactly `num_buckets` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets(num_buckets: usize) -> Self {
        Self::with_num_buckets_and_capacity(num_buckets, DEFAULT_INITIAL_CAPACITY)
    }

    /// Creates an empty `HashSet` with exactly `num_buckets` buckets and room
    /// for at least `capacity` evenly spread elements.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets_and_capacity(num_buckets: usize, capacity: usize) -> Self {
        Self::from_parts(
            Layout::new(num_buckets, capacity, DEFAULT_LOAD_FACTOR),
            Natural::default(),
        )
    }
}

impl<T, H> HashSet<T, H> {
    /// Creates an empty `HashSet` with [`default_num_buckets`] buckets that
    /// routes and compares elements with `strategy`.
    ///
    /// [`default_num_buckets`]: crate::default_num_buckets
    pub fn with_strategy(strategy: H) -> Self {
        Self::with_num_buckets_and_strategy(router::default_num_buckets(), strategy)
    }

    /// Creates an empty `HashSet` with exactly `num_buckets` buckets that
    /// routes and compares elements with `strategy`.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets_and_strategy(num_buckets: usize, strategy: H) -> Self {
        Self::from_parts(
            Layout::new(num_buckets, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR),
            strategy,
        )
    }

    pub(crate) fn from_parts(layout: Layout, strategy: H) -> Self {
        Self {
            router: Router::new(layout),
            strategy,
        }
    }

    /// Returns the number of buckets, fixed at construction.
    pub fn num_buckets(&self) -> usize {
        self.router.num_buckets()
    }

    /// Returns the strategy used to route and compare elements.
    pub fn strategy(&self) -> &H {
        &self.strategy
    }

    /// Returns the load factor every bucket was created with.
    pub fn load_factor(&self) -> f32 {
        self.router.load_factor()
    }

    /// Returns the sum of the capacities of the buckets.
    pub fn capacity(&self) -> usize {
        self.router.capacity()
    }

    /// Returns the number of elements the `index`-th bucket can hold before
    /// it grows.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.num_buckets()`.
    pub fn bucket_capacity(&self, index: usize) -> usize {
        self.router.bucket_capacity(index)
    }

    /// Returns the number of elements, counting one bucket at a time.
    pub fn len(&self) -> usize {
        self.router.len()
    }

    /// Returns true if every bucket is empty.
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }

    /// Removes every element, clearing one bucket at a time.
    pub fn clear(&self) {
        tracing::trace!(num_buckets = self.num_buckets(), "clearing set");

        self.router.clear();
    }

    /// Returns a disconnected copy of every element.
    pub fn iter(&self) -> Snapshot<T>
    where
        T: Clone,
    {
        self.router.snapshot(T::clone)
    }

    /// Copies every element into a `Vec`.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().into_vec()
    }

    /// Keeps only the elements for which `keep` returns true.
    ///
    /// Each bucket is filtered under its write lock. `keep` must not access
    /// this set.
    pub fn retain<F: FnMut(&T) -> bool>(&self, mut keep: F) {
        let mut removed = 0;

        self.router.for_each_mut(|_, bucket| {
            removed += bucket.retain(|element| keep(element));
        });

        tracing::trace!(removed, "retained set elements");
    }

    #[inline]
    fn hash<Q: ?Sized>(&self, element: &Q) -> u64
    where
        H: HashStrategy<Q>,
    {
        HashStrategy::<Q>::hash_of(&self.strategy, element)
    }

    #[inline]
    fn element_eq<Q: ?Sized>(&self, stored: &T, element: &Q) -> bool
    where
        T: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        HashStrategy::<Q>::equals(&self.strategy, Borrow::<Q>::borrow(stored), element)
    }
}

impl<T, H> HashSet<T, H> {
    /// Returns the index of the bucket `element` is routed to.
    pub fn bucket_index<Q: ?Sized>(&self, element: &Q) -> usize
    where
        T: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        self.router.bucket_of(self.hash(element))
    }

    /// Returns true if the set contains `element`.
    pub fn contains<Q: ?Sized>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        let hash = self.hash(element);

        self.router
            .read_for(hash)
            .find(hash, |stored| self.element_eq(stored, element))
            .is_some()
    }

    /// Returns a copy of the stored element equal to `element`.
    pub fn get<Q: ?Sized>(&self, element: &Q) -> Option<T>
    where
        T: Borrow<Q> + Clone,
        H: HashStrategy<Q>,
    {
        let hash = self.hash(element);

        self.router
            .read_for(hash)
            .find(hash, |stored| self.element_eq(stored, element))
            .cloned()
    }

    /// Removes `element`, returning true if it was present.
    pub fn remove<Q: ?Sized>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        self.take(element).is_some()
    }

    /// Removes and returns the stored element equal to `element`.
    pub fn take<Q: ?Sized>(&self, element: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        let hash = self.hash(element);

        self.router
            .write_for(hash)
            .remove(hash, |stored| self.element_eq(stored, element))
    }

    /// Removes every element in `elements`, returning true if any was
    /// present.
    ///
    /// Each removal locks its own bucket.
    pub fn remove_all<I>(&self, elements: I) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
        H: HashStrategy<T>,
    {
        let mut changed = false;

        for element in elements {
            changed |= self.remove(Borrow::<T>::borrow(&element));
        }

        changed
    }

    /// Returns true if every element in `elements` is present.
    ///
    /// Each lookup locks its own bucket, so this is not atomic with respect
    /// to concurrent writers.
    pub fn contains_all<I>(&self, elements: I) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
        H: HashStrategy<T>,
    {
        elements
            .into_iter()
            .all(|element| self.contains(Borrow::<T>::borrow(&element)))
    }

    /// Keeps only the elements equal to some element of `elements`, returning
    /// true if anything was removed.
    ///
    /// `elements` is first split by bucket with this set's strategy. Each
    /// bucket is then filtered against its own share while its write lock is
    /// held, once per bucket.
    pub fn retain_all<I>(&self, elements: I) -> bool
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
        H: HashStrategy<T>,
    {
        let item_hash =
            |item: &I::Item| HashStrategy::<T>::hash_of(&self.strategy, Borrow::<T>::borrow(item));

        let mut partitions: Vec<Bucket<I::Item>> = (0..self.num_buckets())
            .map(|_| Bucket::with_capacity_and_load_factor(0, DEFAULT_LOAD_FACTOR))
            .collect();

        for item in elements {
            let hash = item_hash(&item);
            partitions[self.router.bucket_of(hash)].insert_unique(hash, item, item_hash);
        }

        let mut removed = 0;

        self.router.for_each_mut(|index, bucket| {
            let keep = &partitions[index];

            removed += bucket.retain(|stored| {
                let stored: &T = stored;
                let hash = HashStrategy::<T>::hash_of(&self.strategy, stored);

                keep.find(hash, |item| {
                    HashStrategy::<T>::equals(&self.strategy, stored, Borrow::<T>::borrow(item))
                })
                .is_some()
            });
        });

        tracing::trace!(removed, "retained set intersection");

        removed > 0
    }
}

impl<T, H: HashStrategy<T>> HashSet<T, H> {
    /// Adds `element`, returning true if it was not already present.
    ///
    /// If an equal element is present it is kept and `element` is dropped.
    pub fn insert(&self, element: T) -> bool {
        let hash = self.hash(&element);
        let mut bucket = self.router.write_for(hash);

        if bucket
            .find(hash, |stored| self.strategy.equals(stored, &element))
            .is_some()
        {
            return false;
        }

        bucket.insert_unique(hash, element, |stored| self.strategy.hash_of(stored));

        true
    }

    /// Adds every element of `elements`, returning true if any was not
    /// already present.
    ///
    /// Each insertion locks its own bucket.
    pub fn insert_all<I: IntoIterator<Item = T>>(&self, elements: I) -> bool {
        let mut changed = false;

        for element in elements {
            changed |= self.insert(element);
        }

        changed
    }
}

impl<T> Default for HashSet<T, Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug, H> fmt::Debug for HashSet<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();

        for index in 0..self.num_buckets() {
            set.entries(self.router.read(index).iter());
        }

        set.finish()
    }
}

impl<'a, T, H: HashStrategy<T>> Extend<T> for &'a HashSet<T, H> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        self.insert_all(elements);
    }
}

impl<T, H: HashStrategy<T>> Extend<T> for HashSet<T, H> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, elements: I) {
        self.insert_all(elements);
    }
}

impl<T: Hash + Eq> FromIterator<T> for HashSet<T, Natural> {
    fn from_iter<I: IntoIterator<Item = T>>(elements: I) -> Self {
        let set = Self::new();
        set.insert_all(elements);

        set
    }
}

impl<T, H> IntoIterator for HashSet<T, H> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.router.into_elements())
    }
}

#[cfg(test)]
mod tests;

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

//! A lock-striped concurrent hash map.

use crate::{
    config::{DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR},
    default_value::DefaultValue,
    router::{self, Layout, Router},
    snapshot::{IntoIter, Snapshot},
    strategy::{HashStrategy, Identity, Natural},
};

use std::{
    borrow::Borrow,
    fmt, mem,
    sync::Arc,
};

/// A concurrent hash map split into independently locked buckets.
///
/// Every key is routed to exactly one bucket by its hash, and each bucket is
/// a single-threaded hash table guarded by its own reader-writer lock.
/// Lookups take that bucket's read lock, mutations take its write lock, and
/// no operation ever holds more than one bucket lock at a time. Operations on
/// keys in different buckets therefore never wait on each other, while
/// operations on the same bucket are serialized by its writer exclusivity.
///
/// Operations that touch the whole map ([`len`], [`contains_value`],
/// [`snapshot`], [`clear`], [`retain`]) visit the buckets one by one. They
/// always terminate and never see a torn bucket, but they do not observe the
/// map at a single instant: a concurrent insert into a bucket that was
/// already visited is missed, and [`len`] may return a count that never
/// existed as a whole.
///
/// Hashing and equality come from the strategy `H`. The default,
/// [`Natural`], uses the key's own [`Hash`] and [`Eq`] through [aHash];
/// [`Identity`] compares `Arc` keys by address; any [`HashStrategy`] can be
/// supplied with [`with_strategy`] or a [`Builder`].
///
/// Values are returned by clone, since the entry stays in the map after the
/// bucket lock is released. Values removed or replaced are moved out instead.
///
/// Every map also carries a default return value, the sentinel handed back by
/// [`get_or_default`], [`put`] and [`remove_or_default`] when a key is
/// absent. It is shared by all buckets and can be changed at any time with
/// [`set_default_return_value`]; the change is seen by every bucket at once.
///
/// [`len`]: #method.len
/// [`contains_value`]: #method.contains_value
/// [`snapshot`]: #method.snapshot
/// [`clear`]: #method.clear
/// [`retain`]: #method.retain
/// [`with_strategy`]: #method.with_strategy
/// [`get_or_default`]: #method.get_or_default
/// [`put`]: #method.put
/// [`remove_or_default`]: #method.remove_or_default
/// [`set_default_return_value`]: #method.set_default_return_value
/// [`Builder`]: crate::Builder
/// [aHash]: https://docs.rs/ahash
/// [`Hash`]: https://doc.rust-lang.org/std/hash/trait.Hash.html
/// [`Eq`]: https://doc.rust-lang.org/std/cmp/trait.Eq.html
pub struct HashMap<K, V, H = Natural> {
    router: Router<(K, V)>,
    strategy: H,
    default_value: DefaultValue<V>,
}

/// Primitive keys and primitive values.
pub type IntIntHashMap = HashMap<i32, i32>;

/// `i32` keys with arbitrary values.
pub type IntHashMap<V> = HashMap<i32, V>;

/// `i64` keys with arbitrary values.
pub type LongHashMap<V> = HashMap<i64, V>;

/// Shared references as keys, compared by identity, with `i32` values.
pub type IdentityIntHashMap<T> = HashMap<Arc<T>, i32, Identity>;

impl<K, V> HashMap<K, V, Natural> {
    /// Creates an empty `HashMap` with [`default_num_buckets`] buckets and
    /// room for [`DEFAULT_INITIAL_CAPACITY`] entries.
    ///
    /// [`default_num_buckets`]: crate::default_num_buckets
    /// [`DEFAULT_INITIAL_CAPACITY`]: crate::DEFAULT_INITIAL_CAPACITY
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
    }

    /// Creates an empty `HashMap` with [`default_num_buckets`] buckets and
    /// room for at least `capacity` evenly spread entries before any bucket
    /// grows.
    ///
    /// [`default_num_buckets`]: crate::default_num_buckets
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_num_buckets_and_capacity(router::default_num_buckets(), capacity)
    }

    /// Creates an empty `HashMap` with exactly `num_buckets` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets(num_buckets: usize) -> Self {
        Self::with_num_buckets_and_capacity(num_buckets, DEFAULT_INITIAL_CAPACITY)
    }

    /// Creates an empty `HashMap` with exactly `num_buckets` buckets and room
    /// for at least `capacity` evenly spread entries. Each bucket is sized
    /// for `capacity / num_buckets` entries, rounded up.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets_and_capacity(num_buckets: usize, capacity: usize) -> Self {
        Self::from_parts(
            Layout::new(num_buckets, capacity, DEFAULT_LOAD_FACTOR),
            None,
            Natural::default(),
        )
    }
}

impl<K, V, H> HashMap<K, V, H> {
    /// Creates an empty `HashMap` with [`default_num_buckets`] buckets that
    /// hashes and compares keys with `strategy`.
    ///
    /// [`default_num_buckets`]: crate::default_num_buckets
    pub fn with_strategy(strategy: H) -> Self {
        Self::with_num_buckets_and_strategy(router::default_num_buckets(), strategy)
    }

    /// Creates an empty `HashMap` with exactly `num_buckets` buckets that
    /// hashes and compares keys with `strategy`.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0.
    pub fn with_num_buckets_and_strategy(num_buckets: usize, strategy: H) -> Self {
        Self::from_parts(
            Layout::new(num_buckets, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR),
            None,
            strategy,
        )
    }

    pub(crate) fn from_parts(layout: Layout, default_value: Option<V>, strategy: H) -> Self {
        let default_value = match default_value {
            Some(value) => DefaultValue::new(value),
            None => DefaultValue::unset(),
        };

        Self {
            router: Router::new(layout),
            strategy,
            default_value,
        }
    }

    /// Returns the number of buckets, fixed at construction.
    pub fn num_buckets(&self) -> usize {
        self.router.num_buckets()
    }

    /// Returns the strategy used to hash and compare keys.
    pub fn strategy(&self) -> &H {
        &self.strategy
    }

    /// Returns the load factor every bucket was created with.
    pub fn load_factor(&self) -> f32 {
        self.router.load_factor()
    }

    /// Returns the number of entries this map can hold before some bucket
    /// has to grow, assuming an even spread. This is the sum of the
    /// capacities of the buckets.
    pub fn capacity(&self) -> usize {
        self.router.capacity()
    }

    /// Returns the number of entries the `index`-th bucket can hold before it
    /// grows.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.num_buckets()`.
    pub fn bucket_capacity(&self, index: usize) -> usize {
        self.router.bucket_capacity(index)
    }

    /// Returns the number of entries in the map.
    ///
    /// Each bucket is counted under its own read lock, one after the other.
    /// With concurrent writers the result is a sum of per-bucket counts taken
    /// at different moments.
    pub fn len(&self) -> usize {
        self.router.len()
    }

    /// Returns true if every bucket is empty.
    ///
    /// Like [`len`](#method.len), this is not an atomic view of the map.
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }

    /// Removes every entry, clearing one bucket at a time.
    ///
    /// Entries inserted into an already cleared bucket while this runs are
    /// kept.
    pub fn clear(&self) {
        tracing::trace!(num_buckets = self.num_buckets(), "clearing map");

        self.router.clear();
    }

    /// Returns true if some entry has a value equal to `value`.
    ///
    /// Buckets are scanned one at a time and the scan stops at the first
    /// match. A matching entry inserted into an already scanned bucket during
    /// the call is not seen.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.router
            .any(|bucket| bucket.iter().any(|(_, v)| v == value))
    }

    /// Returns a disconnected copy of every entry.
    ///
    /// Each bucket is copied under its read lock, so the snapshot holds every
    /// bucket as it was when visited; see [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.router.snapshot(|(k, v)| (k.clone(), v.clone()))
    }

    /// Returns a disconnected copy of every key.
    pub fn keys(&self) -> Snapshot<K>
    where
        K: Clone,
    {
        self.router.snapshot(|(k, _)| k.clone())
    }

    /// Returns a disconnected copy of every value.
    pub fn values(&self) -> Snapshot<V>
    where
        V: Clone,
    {
        self.router.snapshot(|(_, v)| v.clone())
    }

    /// Keeps only the entries for which `keep` returns true.
    ///
    /// Each bucket is filtered in one pass under its write lock. `keep` runs
    /// while that lock is held and must not access this map.
    pub fn retain<F: FnMut(&K, &mut V) -> bool>(&self, mut keep: F) {
        let mut removed = 0;

        self.router.for_each_mut(|_, bucket| {
            removed += bucket.retain(|(k, v)| keep(k, v));
        });

        tracing::trace!(removed, "retained map entries");
    }

    /// Returns the current default return value.
    ///
    /// Unless one was set, this is `V::default()`.
    pub fn default_return_value(&self) -> V
    where
        V: Default + Clone,
    {
        self.default_value.load_or_else(V::default)
    }

    /// Replaces the default return value.
    ///
    /// All buckets share a single sentinel, so every lookup that completes
    /// after this call returns sees `value`. The previous sentinel is dropped
    /// once no concurrent lookup can still be reading it.
    pub fn set_default_return_value(&self, value: V)
    where
        V: Send + 'static,
    {
        tracing::trace!("replacing default return value");

        self.default_value.store(value);
    }

    #[inline]
    fn hash<Q: ?Sized>(&self, key: &Q) -> u64
    where
        H: HashStrategy<Q>,
    {
        HashStrategy::<Q>::hash_of(&self.strategy, key)
    }

    #[inline]
    fn key_eq<Q: ?Sized>(&self, stored: &K, key: &Q) -> bool
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        HashStrategy::<Q>::equals(&self.strategy, Borrow::<Q>::borrow(stored), key)
    }
}

impl<K, V, H> HashMap<K, V, H> {
    /// Returns the index of the bucket `key` is routed to.
    pub fn bucket_index<Q: ?Sized>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        self.router.bucket_of(self.hash(key))
    }

    /// Returns a copy of the value corresponding to `key`.
    ///
    /// `Q` can be any borrowed form of `K`, but the strategy must hash and
    /// compare `Q` exactly like `K`. This holds for [`Natural`] by the
    /// contract of [`Borrow`].
    ///
    /// [`Borrow`]: https://doc.rust-lang.org/std/borrow/trait.Borrow.html
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
        V: Clone,
    {
        self.get_key_value_and(key, |_, v| v.clone())
    }

    /// Returns a copy of the key and value corresponding to `key`.
    pub fn get_key_value<Q: ?Sized>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q> + Clone,
        H: HashStrategy<Q>,
        V: Clone,
    {
        self.get_key_value_and(key, |k, v| (k.clone(), v.clone()))
    }

    /// Invokes `with_value` with a reference to the value corresponding to
    /// `key`.
    ///
    /// `with_value` is only invoked if `key` is present, and runs while the
    /// bucket's read lock is held.
    pub fn get_and<Q: ?Sized, F: FnOnce(&V) -> T, T>(&self, key: &Q, with_value: F) -> Option<T>
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        self.get_key_value_and(key, move |_, v| with_value(v))
    }

    /// Invokes `with_entry` with a reference to the key and value
    /// corresponding to `key`.
    pub fn get_key_value_and<Q: ?Sized, F: FnOnce(&K, &V) -> T, T>(
        &self,
        key: &Q,
        with_entry: F,
    ) -> Option<T>
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        let hash = self.hash(key);
        let bucket = self.router.read_for(hash);

        bucket
            .find(hash, |(k, _)| self.key_eq(k, key))
            .map(|(k, v)| with_entry(k, v))
    }

    /// Returns a copy of the value corresponding to `key`, or the default
    /// return value if `key` is absent.
    pub fn get_or_default<Q: ?Sized>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
        V: Default + Clone,
    {
        self.get(key).unwrap_or_else(|| self.default_return_value())
    }

    /// Returns true if the map contains `key`.
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        self.get_key_value_and(key, |_, _| ()).is_some()
    }

    /// Removes `key` and returns its value, if it was present.
    pub fn remove<Q: ?Sized>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key` and returns the stored key and value, if it was present.
    pub fn remove_entry<Q: ?Sized>(&self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        let hash = self.hash(key);
        let mut bucket = self.router.write_for(hash);

        bucket.remove(hash, |(k, _)| self.key_eq(k, key))
    }

    /// Removes `key` and returns its value, or the default return value if it
    /// was absent.
    pub fn remove_or_default<Q: ?Sized>(&self, key: &Q) -> V
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
        V: Default + Clone,
    {
        self.remove(key).unwrap_or_else(|| self.default_return_value())
    }

    /// Removes `key` if it is present and `condition` returns true for its
    /// entry, returning the removed value.
    ///
    /// `condition` runs at most once, under the bucket's write lock.
    pub fn remove_if<Q: ?Sized, F: FnOnce(&K, &V) -> bool>(
        &self,
        key: &Q,
        condition: F,
    ) -> Option<V>
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        let hash = self.hash(key);
        let mut bucket = self.router.write_for(hash);

        bucket
            .remove_if(hash, |(k, _)| self.key_eq(k, key), |(k, v)| condition(k, v))
            .map(|(_, v)| v)
    }

    /// If `key` is present, replaces its value with the result of
    /// `on_modify` and returns the previous value.
    ///
    /// `on_modify` runs at most once, under the bucket's write lock.
    pub fn modify<Q: ?Sized, F: FnOnce(&K, &V) -> V>(&self, key: &Q, on_modify: F) -> Option<V>
    where
        K: Borrow<Q>,
        H: HashStrategy<Q>,
    {
        let hash = self.hash(key);
        let mut bucket = self.router.write_for(hash);

        bucket
            .find_mut(hash, |(k, _)| self.key_eq(k, key))
            .map(|(k, v)| {
                let new_value = on_modify(k, v);

                mem::replace(v, new_value)
            })
    }
}

impl<K, V, H: HashStrategy<K>> HashMap<K, V, H> {
    /// Inserts a key-value pair and returns the value previously associated
    /// with `key`, if any.
    ///
    /// If `key` was present, the stored key is kept and only the value is
    /// replaced.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        let hash = self.hash(&key);
        let mut bucket = self.router.write_for(hash);

        if let Some((_, v)) = bucket.find_mut(hash, |(k, _)| self.strategy.equals(k, &key)) {
            return Some(mem::replace(v, value));
        }

        bucket.insert_unique(hash, (key, value), |(k, _)| self.strategy.hash_of(k));

        None
    }

    /// Inserts a key-value pair and returns the previous value, or the default
    /// return value if `key` was absent.
    pub fn put(&self, key: K, value: V) -> V
    where
        V: Default + Clone,
    {
        self.insert(key, value).unwrap_or_else(|| self.default_return_value())
    }

    /// Inserts `value` if `key` is absent. Otherwise, replaces the current
    /// value with the result of `on_modify`. Returns the previous value, if
    /// any.
    pub fn insert_or_modify<F: FnOnce(&K, &V) -> V>(
        &self,
        key: K,
        value: V,
        on_modify: F,
    ) -> Option<V> {
        self.insert_with_or_modify(key, move || value, on_modify)
    }

    /// Inserts the result of `on_insert` if `key` is absent. Otherwise,
    /// replaces the current value with the result of `on_modify`. Returns the
    /// previous value, if any.
    ///
    /// Exactly one of `on_insert` and `on_modify` is invoked, under the
    /// bucket's write lock.
    pub fn insert_with_or_modify<F: FnOnce() -> V, G: FnOnce(&K, &V) -> V>(
        &self,
        key: K,
        on_insert: F,
        on_modify: G,
    ) -> Option<V> {
        let hash = self.hash(&key);
        let mut bucket = self.router.write_for(hash);

        if let Some((k, v)) = bucket.find_mut(hash, |(k, _)| self.strategy.equals(k, &key)) {
            let new_value = on_modify(k, v);

            return Some(mem::replace(v, new_value));
        }

        bucket.insert_unique(hash, (key, on_insert()), |(k, _)| self.strategy.hash_of(k));

        None
    }

    /// Inserts every pair from `entries`.
    ///
    /// Each pair is an independent [`insert`](#method.insert) that locks and
    /// unlocks its bucket, so other threads may observe the map with only
    /// some of the pairs inserted.
    pub fn insert_all<I: IntoIterator<Item = (K, V)>>(&self, entries: I) {
        for (key, value) in entries {
            self.insert(key, value);
        }
    }
}

impl<K, V> Default for HashMap<K, V, Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, H> fmt::Debug for HashMap<K, V, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();

        for index in 0..self.num_buckets() {
            let bucket = self.router.read(index);
            map.entries(bucket.iter().map(|(k, v)| (k, v)));
        }

        map.finish()
    }
}

impl<'a, K, V, H: HashStrategy<K>> Extend<(K, V)> for &'a HashMap<K, V, H> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        self.insert_all(entries);
    }
}

impl<K, V, H: HashStrategy<K>> Extend<(K, V)> for HashMap<K, V, H> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, entries: I) {
        self.insert_all(entries);
    }
}

impl<K: std::hash::Hash + Eq, V> FromIterator<(K, V)> for HashMap<K, V, Natural> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(entries: I) -> Self {
        let map = Self::new();
        map.insert_all(entries);

        map
    }
}

impl<K, V, H> IntoIterator for HashMap<K, V, H> {
    type Item = (K, V);
    type IntoIter = IntoIter<(K, V)>;

    /// Consumes the map and yields every entry. No locks are taken, since
    /// the map is no longer shared.
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.router.into_elements())
    }
}

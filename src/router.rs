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

//! Bucket routing and the per-bucket lock array shared by maps and sets.
//!
//! A `Router` owns a fixed number of buckets, each behind its own
//! reader-writer lock. Keyed operations hash their key, pick a bucket with
//! [`Router::bucket_of`] and lock only that bucket. Whole-container
//! operations visit the buckets in index order and never hold more than one
//! lock at a time, so no lock ordering is ever needed and no deadlock between
//! buckets is possible. The price is that they see each bucket at a slightly
//! different moment.

use crate::{bucket::Bucket, snapshot::Snapshot};

use std::{iter::Flatten, vec};

use crossbeam_utils::CachePadded;
use hashbrown::hash_table;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Returns the bucket count used when none is specified.
///
/// This is one less than the number of CPUs, but never less than one.
pub fn default_num_buckets() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// The validated shape of a container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Layout {
    pub(crate) num_buckets: usize,
    pub(crate) bucket_capacity: usize,
    pub(crate) load_factor: f32,
}

impl Layout {
    /// Splits `capacity` evenly across `num_buckets`, rounding up.
    ///
    /// # Panics
    ///
    /// Panics if `num_buckets` is 0 or `load_factor` is not in `(0, 1]`.
    pub(crate) fn new(num_buckets: usize, capacity: usize, load_factor: f32) -> Self {
        assert!(num_buckets > 0, "bucket count must be at least 1");
        assert!(
            load_factor > 0.0 && load_factor <= 1.0,
            "load factor must be in (0, 1]"
        );

        Self {
            num_buckets,
            bucket_capacity: capacity.div_ceil(num_buckets),
            load_factor,
        }
    }
}

pub(crate) struct Router<T> {
    buckets: Box<[CachePadded<RwLock<Bucket<T>>>]>,
}

impl<T> Router<T> {
    pub(crate) fn new(layout: Layout) -> Self {
        let buckets: Box<[_]> = (0..layout.num_buckets)
            .map(|_| {
                CachePadded::new(RwLock::new(Bucket::with_capacity_and_load_factor(
                    layout.bucket_capacity,
                    layout.load_factor,
                )))
            })
            .collect();

        tracing::debug!(
            num_buckets = layout.num_buckets,
            bucket_capacity = layout.bucket_capacity,
            load_factor = layout.load_factor,
            "created striped buckets"
        );

        Self { buckets }
    }

    #[inline]
    pub(crate) fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Maps `hash` to a bucket index in `0..num_buckets`.
    #[inline]
    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    #[inline]
    pub(crate) fn read(&self, index: usize) -> RwLockReadGuard<'_, Bucket<T>> {
        self.buckets[index].read()
    }

    #[inline]
    pub(crate) fn write(&self, index: usize) -> RwLockWriteGuard<'_, Bucket<T>> {
        self.buckets[index].write()
    }

    #[inline]
    pub(crate) fn read_for(&self, hash: u64) -> RwLockReadGuard<'_, Bucket<T>> {
        self.read(self.bucket_of(hash))
    }

    #[inline]
    pub(crate) fn write_for(&self, hash: u64) -> RwLockWriteGuard<'_, Bucket<T>> {
        self.write(self.bucket_of(hash))
    }

    /// Sums `f` over every bucket, read-locking one bucket at a time.
    pub(crate) fn sum(&self, mut f: impl FnMut(&Bucket<T>) -> usize) -> usize {
        self.buckets.iter().map(|bucket| f(&bucket.read())).sum()
    }

    /// Returns true as soon as `f` returns true for some bucket, read-locking
    /// one bucket at a time.
    pub(crate) fn any(&self, mut f: impl FnMut(&Bucket<T>) -> bool) -> bool {
        self.buckets.iter().any(|bucket| f(&bucket.read()))
    }

    /// Invokes `f` on every bucket, write-locking one bucket at a time.
    pub(crate) fn for_each_mut(&self, mut f: impl FnMut(usize, &mut Bucket<T>)) {
        for index in 0..self.num_buckets() {
            f(index, &mut self.write(index));
        }
    }

    /// Copies every element through `f` into a [`Snapshot`], read-locking one
    /// bucket at a time.
    pub(crate) fn snapshot<U>(&self, mut f: impl FnMut(&T) -> U) -> Snapshot<U> {
        // Only a size hint; buckets may change while we walk them.
        let mut elements = Vec::with_capacity(self.len());

        for bucket in self.buckets.iter() {
            let bucket = bucket.read();
            elements.extend(bucket.iter().map(&mut f));
        }

        Snapshot::new(elements)
    }

    pub(crate) fn len(&self) -> usize {
        self.sum(Bucket::len)
    }

    pub(crate) fn is_empty(&self) -> bool {
        !self.any(|bucket| !bucket.is_empty())
    }

    pub(crate) fn capacity(&self) -> usize {
        self.sum(Bucket::capacity)
    }

    pub(crate) fn bucket_capacity(&self, index: usize) -> usize {
        assert!(index < self.buckets.len());

        self.read(index).capacity()
    }

    pub(crate) fn load_factor(&self) -> f32 {
        self.read(0).load_factor()
    }

    pub(crate) fn clear(&self) {
        self.for_each_mut(|_, bucket| bucket.clear());
    }

    /// Consumes the router and yields every element without locking.
    pub(crate) fn into_elements(self) -> Flatten<vec::IntoIter<hash_table::IntoIter<T>>> {
        self.buckets
            .into_vec()
            .into_iter()
            .map(|bucket| CachePadded::into_inner(bucket).into_inner().into_elements())
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
    }
}

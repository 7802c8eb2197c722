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

//! Iterators over owned copies of a container's contents.

use std::{
    fmt,
    iter::{Flatten, FusedIterator},
    vec,
};

use hashbrown::hash_table;

/// An iterator over a point-in-time copy of a container's contents.
///
/// A `Snapshot` is built by locking each bucket in turn and copying its
/// contents out, so it reflects every bucket as it was at the moment that
/// bucket was visited. It is completely disconnected from the container it
/// came from: later changes to the container are not visible through it, and
/// consuming it never affects the container.
///
/// Elements are yielded grouped by bucket, in no particular order within a
/// bucket.
pub struct Snapshot<T> {
    elements: vec::IntoIter<T>,
}

impl<T> Snapshot<T> {
    pub(crate) fn new(elements: Vec<T>) -> Self {
        Self {
            elements: elements.into_iter(),
        }
    }

    /// Returns the remaining elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        self.elements.as_slice()
    }

    /// Collects the remaining elements into a `Vec`.
    pub fn into_vec(self) -> Vec<T> {
        self.elements.collect()
    }
}

impl<T> Iterator for Snapshot<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.elements.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.elements.size_hint()
    }
}

impl<T> DoubleEndedIterator for Snapshot<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.elements.next_back()
    }
}

impl<T> ExactSizeIterator for Snapshot<T> {}

impl<T> FusedIterator for Snapshot<T> {}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// An iterator that drains a container it has taken ownership of.
///
/// Returned by the `IntoIterator` implementations of [`HashMap`] and
/// [`HashSet`]. Elements are yielded bucket by bucket.
///
/// [`HashMap`]: crate::HashMap
/// [`HashSet`]: crate::HashSet
pub struct IntoIter<T> {
    elements: Flatten<vec::IntoIter<hash_table::IntoIter<T>>>,
}

impl<T> IntoIter<T> {
    pub(crate) fn new(elements: Flatten<vec::IntoIter<hash_table::IntoIter<T>>>) -> Self {
        Self { elements }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.elements.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.elements.size_hint()
    }
}

impl<T> FusedIterator for IntoIter<T> {}

impl<T> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter").finish_non_exhaustive()
    }
}

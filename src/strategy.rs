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

//! Pluggable hashing and equality for keys and elements.
//!
//! Every container routes keys to buckets and compares them through a
//! [`HashStrategy`]. [`Natural`] uses the type's own [`Hash`] and [`Eq`]
//! implementations, [`Identity`] compares shared pointers by address, and
//! [`FnStrategy`] adapts a pair of closures.

use std::{
    fmt,
    hash::{BuildHasher, Hash},
    ptr,
    sync::Arc,
};

/// Default hasher for [`Natural`] and [`Identity`].
///
/// This is currently [aHash]. It is fast for both integer and string keys and
/// provides some resistance to DoS attacks. Every container builds its own
/// randomly seeded instance.
///
/// [aHash]: https://docs.rs/ahash
pub type DefaultHashBuilder = ahash::RandomState;

/// A hash function paired with the equality it must agree with.
///
/// Implementations must uphold
///
/// ```text
/// equals(a, b) -> hash_of(a) == hash_of(b)
/// ```
///
/// Containers rely on this to send equal values to the same bucket. A
/// strategy that breaks it will not cause undefined behavior, but lookups may
/// miss and duplicates may be stored.
pub trait HashStrategy<T: ?Sized> {
    /// Returns the hash of `value`.
    fn hash_of(&self, value: &T) -> u64;

    /// Returns true if `a` and `b` are equal under this strategy.
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// Hashes with [`Hash`] through a [`BuildHasher`] and compares with [`Eq`].
///
/// Because [`Borrow`] requires borrowed forms to hash and compare like their
/// owners, `Natural` can be used to look up `String` keys by `&str` and so
/// on.
///
/// [`Borrow`]: std::borrow::Borrow
#[derive(Clone, Default)]
pub struct Natural<S = DefaultHashBuilder> {
    build_hasher: S,
}

impl<S> Natural<S> {
    /// Creates a strategy that hashes with `build_hasher`.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self { build_hasher }
    }

    /// Returns the hash builder this strategy hashes with.
    pub fn hasher(&self) -> &S {
        &self.build_hasher
    }
}

impl<Q: ?Sized + Hash + Eq, S: BuildHasher> HashStrategy<Q> for Natural<S> {
    #[inline]
    fn hash_of(&self, value: &Q) -> u64 {
        self.build_hasher.hash_one(value)
    }

    #[inline]
    fn equals(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

impl<S> fmt::Debug for Natural<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Natural").finish_non_exhaustive()
    }
}

/// Compares shared pointers by the address they point to.
///
/// Two `Arc`s are equal under `Identity` only if they point to the same
/// allocation, regardless of what [`PartialEq`] says about their contents.
/// The address is run through a [`BuildHasher`] so that aligned addresses
/// still spread evenly across buckets.
#[derive(Clone, Default)]
pub struct Identity<S = DefaultHashBuilder> {
    build_hasher: S,
}

impl<S> Identity<S> {
    /// Creates a strategy that hashes addresses with `build_hasher`.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self { build_hasher }
    }
}

impl<S: BuildHasher> Identity<S> {
    fn hash_address<T: ?Sized>(&self, pointer: *const T) -> u64 {
        self.build_hasher.hash_one(pointer.cast::<()>() as usize)
    }
}

impl<T: ?Sized, S: BuildHasher> HashStrategy<Arc<T>> for Identity<S> {
    #[inline]
    fn hash_of(&self, value: &Arc<T>) -> u64 {
        self.hash_address(Arc::as_ptr(value))
    }

    #[inline]
    fn equals(&self, a: &Arc<T>, b: &Arc<T>) -> bool {
        ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
    }
}

impl<'a, T: ?Sized, S: BuildHasher> HashStrategy<&'a T> for Identity<S> {
    #[inline]
    fn hash_of(&self, value: &&'a T) -> u64 {
        self.hash_address(*value as *const T)
    }

    #[inline]
    fn equals(&self, a: &&'a T, b: &&'a T) -> bool {
        ptr::addr_eq(*a as *const T, *b as *const T)
    }
}

impl<S> fmt::Debug for Identity<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity").finish_non_exhaustive()
    }
}

/// A strategy built from a hash closure and an equality closure.
///
/// ```
/// use lockstripe::{strategy::FnStrategy, HashSet};
///
/// let strategy = FnStrategy::new(
///     |s: &String| s.len() as u64,
///     |a: &String, b: &String| a.eq_ignore_ascii_case(b),
/// );
/// let set = HashSet::with_num_buckets_and_strategy(4, strategy);
///
/// assert!(set.insert("Hello".to_string()));
/// assert!(!set.insert("HELLO".to_string()));
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Clone)]
pub struct FnStrategy<F, E> {
    hash: F,
    equals: E,
}

impl<F, E> FnStrategy<F, E> {
    /// Creates a strategy from `hash` and `equals`.
    pub fn new(hash: F, equals: E) -> Self {
        Self { hash, equals }
    }
}

impl<T: ?Sized, F: Fn(&T) -> u64, E: Fn(&T, &T) -> bool> HashStrategy<T> for FnStrategy<F, E> {
    #[inline]
    fn hash_of(&self, value: &T) -> u64 {
        (self.hash)(value)
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.equals)(a, b)
    }
}

impl<F, E> fmt::Debug for FnStrategy<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStrategy").finish_non_exhaustive()
    }
}

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

//! The absent-key sentinel shared by every bucket of a map.
//!
//! The sentinel lives in a single atomically swapped cell that lookups read
//! directly, so a change is visible to all buckets at once. Replaced values
//! are reclaimed through `crossbeam_epoch` once no reader can still see them.

use std::sync::atomic::Ordering;

use crossbeam_epoch::{Atomic, Owned, Shared};

pub(crate) struct DefaultValue<V> {
    // Null means "use `V::default()`".
    current: Atomic<V>,
}

impl<V> DefaultValue<V> {
    pub(crate) fn unset() -> Self {
        Self {
            current: Atomic::null(),
        }
    }

    pub(crate) fn new(value: V) -> Self {
        Self {
            current: Atomic::new(value),
        }
    }

    /// Returns a clone of the current sentinel, or the result of `or_else` if
    /// none has been set.
    pub(crate) fn load_or_else(&self, or_else: impl FnOnce() -> V) -> V
    where
        V: Clone,
    {
        let guard = &crossbeam_epoch::pin();
        let current = self.current.load(Ordering::Acquire, guard);

        match unsafe { current.as_ref() } {
            Some(value) => value.clone(),
            None => or_else(),
        }
    }

    pub(crate) fn store(&self, value: V)
    where
        V: Send + 'static,
    {
        let guard = &crossbeam_epoch::pin();
        let previous = self
            .current
            .swap(Owned::new(value), Ordering::AcqRel, guard);

        if !previous.is_null() {
            unsafe { guard.defer_destroy(previous) };
        }
    }
}

impl<V> Drop for DefaultValue<V> {
    fn drop(&mut self) {
        let guard = unsafe { crossbeam_epoch::unprotected() };
        let current = self.current.swap(Shared::null(), Ordering::Relaxed, guard);

        if !current.is_null() {
            drop(unsafe { current.into_owned() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_falls_back() {
        let value = DefaultValue::<i32>::unset();

        assert_eq!(value.load_or_else(|| -1), -1);

        value.store(7);
        assert_eq!(value.load_or_else(|| -1), 7);
    }

    #[test]
    fn store_replaces() {
        let value = DefaultValue::new("foo".to_string());

        assert_eq!(value.load_or_else(String::new), "foo");

        value.store("bar".to_string());
        assert_eq!(value.load_or_else(String::new), "bar");
    }
}

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

//! Container configuration.

use crate::{
    bucket,
    error::{Error, Result},
    map::HashMap,
    router::{self, Layout},
    set::HashSet,
    strategy::Natural,
};

/// Capacity hint used when none is given.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;

/// Configures and builds a [`HashMap`] or [`HashSet`].
///
/// Unlike the shorthand constructors on the containers themselves, which
/// panic on a bad configuration, a `Builder` reports problems as an
/// [`Error`].
///
/// ```
/// use lockstripe::{Builder, HashMap};
///
/// let map: HashMap<i32, i32> = Builder::new()
///     .num_buckets(8)
///     .capacity(1024)
///     .load_factor(0.5)
///     .build_map_with_default(-1)
///     .unwrap();
///
/// assert_eq!(map.num_buckets(), 8);
/// assert_eq!(map.get_or_default(&3), -1);
/// ```
#[derive(Clone, Debug)]
pub struct Builder<H = Natural> {
    num_buckets: Option<usize>,
    capacity: usize,
    load_factor: f32,
    strategy: H,
}

impl Builder<Natural> {
    /// Creates a builder with the default bucket count, capacity, load factor
    /// and strategy.
    pub fn new() -> Self {
        Self {
            num_buckets: None,
            capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            strategy: Natural::default(),
        }
    }
}

impl Default for Builder<Natural> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Builder<H> {
    /// Sets the number of buckets.
    ///
    /// Defaults to [`default_num_buckets`].
    ///
    /// [`default_num_buckets`]: crate::default_num_buckets
    pub fn num_buckets(mut self, num_buckets: usize) -> Self {
        self.num_buckets = Some(num_buckets);
        self
    }

    /// Sets the total number of elements the container should hold before any
    /// bucket has to grow, assuming an even spread.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets how full each bucket may get before it grows.
    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Replaces the hash strategy.
    pub fn strategy<G>(self, strategy: G) -> Builder<G> {
        Builder {
            num_buckets: self.num_buckets,
            capacity: self.capacity,
            load_factor: self.load_factor,
            strategy,
        }
    }

    /// Builds a map whose absent-key sentinel is `V::default()`.
    pub fn build_map<K, V>(self) -> Result<HashMap<K, V, H>> {
        let layout = self.layout::<(K, V)>()?;

        Ok(HashMap::from_parts(layout, None, self.strategy))
    }

    /// Builds a map whose absent-key sentinel is `default_value`.
    pub fn build_map_with_default<K, V>(self, default_value: V) -> Result<HashMap<K, V, H>> {
        let layout = self.layout::<(K, V)>()?;

        Ok(HashMap::from_parts(layout, Some(default_value), self.strategy))
    }

    /// Builds a set.
    pub fn build_set<T>(self) -> Result<HashSet<T, H>> {
        let layout = self.layout::<T>()?;

        Ok(HashSet::from_parts(layout, self.strategy))
    }

    // `T` is the element type each bucket stores.
    fn layout<T>(&self) -> Result<Layout> {
        let num_buckets = self.num_buckets.unwrap_or_else(router::default_num_buckets);

        if num_buckets == 0 {
            return Err(Error::ZeroBuckets);
        }

        // Written to also reject NaN.
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            return Err(Error::InvalidLoadFactor(self.load_factor));
        }

        let layout = Layout::new(num_buckets, self.capacity, self.load_factor);

        if bucket::raw_capacity::<T>(layout.bucket_capacity, layout.load_factor).is_none() {
            return Err(Error::CapacityOverflow {
                capacity: self.capacity,
                load_factor: self.load_factor,
            });
        }

        Ok(layout)
    }
}

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

//! Lock-striped concurrent hash maps and sets.
//!
//! [`HashMap`] and [`HashSet`] split their contents across a fixed number of
//! buckets, each a single-threaded hash table behind its own reader-writer
//! lock. A key is routed to its bucket by its hash, so operations on keys in
//! different buckets proceed in parallel and only operations that land in
//! the same bucket contend. No operation holds more than one bucket lock at
//! a time.
//!
//! The number of buckets is fixed when a container is created and defaults
//! to one less than the number of CPUs, but at least one. Buckets grow
//! independently of each other.
//!
//! How keys are hashed and compared is controlled by a [`HashStrategy`]:
//! [`Natural`] for a type's own `Hash` and `Eq`, [`Identity`] to compare
//! shared pointers by address, or [`FnStrategy`] for arbitrary closures.
//!
//! ```
//! use std::{sync::Arc, thread};
//!
//! use lockstripe::HashMap;
//!
//! let map = Arc::new(HashMap::with_num_buckets(4));
//!
//! let threads: Vec<_> = (0..4)
//!     .map(|i| {
//!         let map = map.clone();
//!
//!         thread::spawn(move || {
//!             for j in 0..64 {
//!                 map.insert(i * 64 + j, j);
//!             }
//!         })
//!     })
//!     .collect();
//!
//! for thread in threads {
//!     thread.join().unwrap();
//! }
//!
//! assert_eq!(map.len(), 256);
//! assert_eq!(map.get(&65), Some(1));
//! ```

pub mod map;
pub mod set;
pub mod strategy;

mod bucket;
mod config;
mod default_value;
mod error;
mod router;
mod snapshot;

pub use config::{Builder, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR};
pub use error::{Error, Result};
pub use map::{HashMap, IdentityIntHashMap, IntHashMap, IntIntHashMap, LongHashMap};
pub use router::default_num_buckets;
pub use set::{HashSet, LongHashSet};
pub use snapshot::{IntoIter, Snapshot};
pub use strategy::{DefaultHashBuilder, FnStrategy, HashStrategy, Identity, Natural};

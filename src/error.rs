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

//! Errors reported while configuring a container.

/// The ways a [`Builder`] configuration can be rejected.
///
/// Data operations on maps and sets never fail; only construction through a
/// [`Builder`] can.
///
/// [`Builder`]: crate::Builder
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// A container needs at least one bucket.
    #[error("bucket count must be at least 1")]
    ZeroBuckets,
    /// The load factor was not in `(0, 1]`.
    #[error("load factor must be in (0, 1], got {0}")]
    InvalidLoadFactor(f32),
    /// A bucket sized for `capacity` elements at `load_factor` would be larger
    /// than any addressable table.
    #[error("capacity {capacity} at load factor {load_factor} exceeds the addressable table size")]
    CapacityOverflow { capacity: usize, load_factor: f32 },
}

pub type Result<T> = std::result::Result<T, Error>;

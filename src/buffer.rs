/*
    This file is part of multistr.

    multistr is free software: you can redistribute it and/or modify
    it under the terms of the GNU Lesser General Public License as published by
    the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    multistr is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU General Public License for more details.

    You should have received a copy of the GNU Lesser General Public License
    along with multistr. (LICENSE.md)  If not, see <https://www.gnu.org/licenses/>.
*/

//! Growable, always-terminated unit buffers.
//!
//! Every string value in this crate owns its storage through a [`SeqBuffer`]:
//! a contiguous run of units followed by one terminator unit (the zero value),
//! so the contents are always safely readable as a terminated sequence.
//! Capacity only ever grows; clearing a buffer keeps its allocation so a
//! following conversion into the same buffer does not reallocate.

use crate::error::{Error, Result};

/// Buffers below this capacity jump straight to it on first growth.
const MIN_CAPACITY: usize = 32;
/// Buffers below this capacity double; at or above it they grow by 25%.
const DOUBLING_LIMIT: usize = 8192;

/// A growable buffer of `T` units with a mandatory trailing terminator.
///
/// `len()` is the number of content units, excluding the terminator. After
/// any mutating operation on an allocated buffer, the unit at index `len()`
/// is `T::default()`.
///
/// Allocation failure (or overflow of the growth arithmetic) releases the
/// buffer entirely: it behaves as freshly initialized afterwards, never as a
/// half-grown torn state.
#[derive(Debug, Clone, Default)]
pub struct SeqBuffer<T> {
    // Holds content plus one terminator unit, or nothing at all when the
    // buffer has never allocated.
    vec: Vec<T>,
}

/// Byte-unit buffer, used for MBS and UTF-8 text.
pub type ByteBuffer = SeqBuffer<u8>;
/// Wide-unit buffer, one unit per wide character.
pub type WideBuffer = SeqBuffer<u32>;

impl<T: Copy + Default + PartialEq> SeqBuffer<T> {
    pub fn new() -> Self {
        SeqBuffer { vec: Vec::new() }
    }

    /// Number of content units, excluding the terminator.
    pub fn len(&self) -> usize {
        self.vec.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total units the buffer can hold without reallocating, terminator
    /// included.
    pub fn capacity(&self) -> usize {
        self.vec.capacity()
    }

    /// The content units, without the terminator.
    pub fn as_units(&self) -> &[T] {
        match self.vec.len() {
            0 => &[],
            n => &self.vec[..n - 1],
        }
    }

    /// The content units followed by the terminator. Empty for a buffer that
    /// has never allocated.
    pub fn terminated(&self) -> &[T] {
        &self.vec
    }

    /// Guarantees capacity for at least `total` units, terminator included.
    ///
    /// Growth is exponential for amortized linear appends: a minimum of 32
    /// units, doubling below 8192, and 25% steps from there on, but always at
    /// least `total`. On overflow or allocator failure the buffer is freed
    /// and `Error::OutOfMemory` returned.
    pub fn ensure(&mut self, total: usize) -> Result<()> {
        let capacity = self.vec.capacity();
        if total <= capacity {
            return Ok(());
        }
        let grown = if capacity < MIN_CAPACITY {
            MIN_CAPACITY
        } else if capacity < DOUBLING_LIMIT {
            capacity * 2
        } else {
            match capacity.checked_add(capacity / 4) {
                Some(n) => n,
                None => {
                    self.free();
                    return Err(Error::OutOfMemory(total));
                }
            }
        };
        let target = grown.max(total);
        let additional = target - self.vec.len();
        if self.vec.try_reserve_exact(additional).is_err() {
            self.free();
            return Err(Error::OutOfMemory(target));
        }
        Ok(())
    }

    /// Appends `units`, growing first, and re-terminates.
    pub fn append(&mut self, units: &[T]) -> Result<()> {
        let total = self
            .len()
            .checked_add(units.len())
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| {
                self.free();
                Error::OutOfMemory(usize::MAX)
            })?;
        self.ensure(total)?;
        self.vec.truncate(self.len());
        self.vec.extend_from_slice(units);
        self.vec.push(T::default());
        Ok(())
    }

    /// Appends a single unit.
    pub fn push(&mut self, unit: T) -> Result<()> {
        self.append(&[unit])
    }

    /// Resets the length to zero without releasing capacity.
    pub fn clear(&mut self) {
        self.vec.clear();
        if self.vec.capacity() > 0 {
            self.vec.push(T::default());
        }
    }

    /// Releases the allocation; length and capacity both become zero.
    pub fn free(&mut self) {
        self.vec = Vec::new();
    }
}

impl ByteBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        self.as_units()
    }

    /// The contents interpreted as UTF-8. Only meaningful for buffers
    /// populated through the UTF-8 producing paths, which never emit invalid
    /// sequences.
    pub fn as_utf8(&self) -> Option<&str> {
        std::str::from_utf8(self.as_units()).ok()
    }
}

impl<T: Copy + Default + PartialEq> PartialEq for SeqBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_units() == other.as_units()
    }
}

impl<T: Copy + Default + PartialEq> Eq for SeqBuffer<T> {}

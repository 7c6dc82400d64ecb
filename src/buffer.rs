//! Bounded sort buffer.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::io::prelude::*;

/// Error returned when a value is inserted into a full buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferFull;

impl Error for BufferFull {}

impl Display for BufferFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sort buffer is at capacity")
    }
}

/// Bounded in-memory container accumulating one chunk's worth of values.
///
/// The buffer is created once per acquisition phase and reused between
/// chunks: filled up to its capacity, sorted in place, spilled, cleared.
pub struct SortBuffer {
    capacity: usize,
    values: Vec<i64>,
}

impl SortBuffer {
    /// Creates a buffer holding at most `capacity` values.
    pub fn new(capacity: usize) -> Self {
        SortBuffer {
            capacity,
            values: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of held values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks if the buffer reached its capacity.
    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Appends a value. Inserting into a full buffer is rejected.
    pub fn insert(&mut self, value: i64) -> Result<(), BufferFull> {
        if self.is_full() {
            return Err(BufferFull);
        }

        self.values.push(value);
        return Ok(());
    }

    /// Sorts the held values ascending, in place. No-op if the buffer holds
    /// one value or less.
    ///
    /// Insertion sort: the capacity is small and bounded, so the quadratic
    /// cost stays negligible and the sort is stable.
    pub fn sort_in_place(&mut self) {
        for i in 1..self.values.len() {
            let value = self.values[i];
            let mut j = i;
            while j > 0 && self.values[j - 1] > value {
                self.values[j] = self.values[j - 1];
                j -= 1;
            }
            self.values[j] = value;
        }
    }

    /// Writes the current contents, in current order, one decimal integer
    /// per line. Does not clear the buffer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for value in &self.values {
            writeln!(writer, "{}", value)?;
        }

        return Ok(());
    }

    /// Drops all held values. Idempotent and safe on an empty buffer.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Read-only view of the current contents, for diagnostics.
    pub fn snapshot(&self) -> &[i64] {
        &self.values
    }
}

//! Bounds-checked byte cursor over a fully resident buffer
//!
//! Shapefiles mix big-endian framing with little-endian payloads. Instead of a
//! mutable endianness flag, every read names its byte order explicitly so a
//! decoding stage can never inherit a stale setting from the previous one.

use crate::{Result, ShapeError};
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Random-access reader over an immutable byte slice
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current read offset in bytes
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the read offset; positions past the end are rejected
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(self.insufficient(position.saturating_sub(self.position)));
        }
        self.position = position;
        Ok(())
    }

    /// Total length of the underlying buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the cursor and the end of the buffer
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Advance without reading
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Borrow the next `count` bytes and advance past them
    pub fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(self.insufficient(count));
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    #[inline]
    pub fn read_i32_be(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    #[inline]
    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    #[inline]
    pub fn read_f64_le(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    fn insufficient(&self, requested: usize) -> ShapeError {
        ShapeError::InsufficientData {
            position: self.position,
            requested,
            length: self.data.len(),
        }
    }
}

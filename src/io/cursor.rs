use bytes::Bytes;

use super::RangeReader;
use crate::error::IoError;
use crate::format::tiff::ByteOrder;

/// Positioned reader over a [`RangeReader`].
///
/// The cursor owns the read position and the byte order of one decode
/// session. Values that live elsewhere in the file are fetched with
/// [`ByteCursor::read_at`], which leaves the position untouched.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a, R: ?Sized> {
    reader: &'a R,
    position: u64,
    byte_order: ByteOrder,
}

impl<'a, R: RangeReader + ?Sized> ByteCursor<'a, R> {
    /// Create a cursor at offset 0.
    pub fn new(reader: &'a R, byte_order: ByteOrder) -> Self {
        Self::at(reader, byte_order, 0)
    }

    /// Create a cursor at an absolute offset.
    pub fn at(reader: &'a R, byte_order: ByteOrder, offset: u64) -> Self {
        Self {
            reader,
            position: offset,
            byte_order,
        }
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Total size of the underlying source.
    #[inline]
    pub fn size(&self) -> u64 {
        self.reader.size()
    }

    /// Bytes left between the position and the end of the source.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.reader.size().saturating_sub(self.position)
    }

    /// Move to an absolute offset. Seeking past the end is allowed; the next
    /// read fails instead.
    pub fn seek(&mut self, offset: u64) {
        self.position = offset;
    }

    /// Move relative to the current position.
    pub fn skip(&mut self, delta: i64) -> Result<(), IoError> {
        self.position = self
            .position
            .checked_add_signed(delta)
            .ok_or(IoError::RangeOutOfBounds {
                offset: self.position,
                requested: delta.unsigned_abs(),
                size: self.reader.size(),
            })?;
        Ok(())
    }

    /// Read `len` bytes and advance.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes, IoError> {
        let bytes = self.reader.read_exact_at(self.position, len)?;
        self.position += len as u64;
        Ok(bytes)
    }

    /// Read `len` bytes at `offset` without moving the cursor.
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        self.reader.read_exact_at(offset, len)
    }

    pub fn read_u16(&mut self) -> Result<u16, IoError> {
        let bytes = self.read_bytes(2)?;
        Ok(self.byte_order.read_u16(&bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32, IoError> {
        let bytes = self.read_bytes(4)?;
        Ok(self.byte_order.read_u32(&bytes))
    }
}

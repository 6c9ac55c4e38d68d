use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from a random-access resource.
///
/// All container parsing goes through this abstraction, so the same parser
/// works over a memory-mapped buffer, a local file or a decrypted region.
/// Reads are absolute: there is no hidden position, which keeps one reader
/// safe to share between independent decode sessions.
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get a unique identifier for this resource (for logging).
    fn identifier(&self) -> &str;
}

impl<R: RangeReader + ?Sized> RangeReader for &R {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        (**self).read_exact_at(offset, len)
    }

    fn size(&self) -> u64 {
        (**self).size()
    }

    fn identifier(&self) -> &str {
        (**self).identifier()
    }
}

/// Check that `[offset, offset + len)` lies within a resource of `size` bytes.
pub(crate) fn check_range(offset: u64, len: usize, size: u64) -> Result<(), IoError> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= size => Ok(()),
        _ => Err(IoError::RangeOutOfBounds {
            offset,
            requested: len as u64,
            size,
        }),
    }
}

// =============================================================================
// MemoryReader
// =============================================================================

/// Range reader over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Bytes,
    identifier: String,
}

impl MemoryReader {
    /// Wrap a buffer.
    pub fn new(data: impl Into<Bytes>, identifier: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            identifier: identifier.into(),
        }
    }

    /// The whole underlying buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

impl RangeReader for MemoryReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size())?;
        let start = offset as usize;
        Ok(self.data.slice(start..start + len))
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

// =============================================================================
// RelocatedReader
// =============================================================================

/// Exposes a detached buffer at its original absolute position.
///
/// A decrypted SR2 region is parsed out of its own buffer, but its records
/// still hold absolute file offsets. Reading through this wrapper maps
/// `offset` to `offset - base`, so those offsets resolve inside the buffer.
#[derive(Debug, Clone)]
pub struct RelocatedReader<R> {
    inner: R,
    base: u64,
}

impl<R: RangeReader> RelocatedReader<R> {
    /// Place `inner` so that its first byte answers absolute offset `base`.
    pub fn new(inner: R, base: u64) -> Self {
        Self { inner, base }
    }

    /// Absolute offset of the first byte.
    pub fn base(&self) -> u64 {
        self.base
    }
}

impl<R: RangeReader> RangeReader for RelocatedReader<R> {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        if offset < self.base {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size(),
            });
        }
        self.inner
            .read_exact_at(offset - self.base, len)
            .map_err(|err| match err {
                IoError::RangeOutOfBounds { requested, .. } => IoError::RangeOutOfBounds {
                    offset,
                    requested,
                    size: self.size(),
                },
                other => other,
            })
    }

    /// One past the last absolute offset served.
    fn size(&self) -> u64 {
        self.base + self.inner.size()
    }

    fn identifier(&self) -> &str {
        self.inner.identifier()
    }
}

// =============================================================================
// Endian Helper Functions
// =============================================================================
//
// TIFF files can be either little-endian or big-endian, determined by the
// marker at the start of the file. These helpers are used by `ByteOrder`.

/// Read a little-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

/// Read a big-endian u16 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 2 bytes.
#[inline]
pub fn read_u16_be(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Read a little-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read a big-endian u32 from a byte slice.
///
/// # Panics
/// Panics if the slice has fewer than 4 bytes.
#[inline]
pub fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

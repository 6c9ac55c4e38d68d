//! Container header parsing.
//!
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Magic (42 = 0x002A), in the declared byte order
//! Bytes 4-7: Offset to the first directory, in the declared byte order
//! ```
//!
//! The detected byte order is returned as part of the header and threaded
//! through every later call; nothing here is process-global.

use serde::Serialize;

use crate::error::FormatError;
use crate::io::{read_u16_be, read_u16_le, read_u32_be, read_u32_le, RangeReader};

// =============================================================================
// Constants
// =============================================================================

/// Marker bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Marker bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Magic value following the byte order marker
pub const TIFF_MAGIC: u16 = 42;

/// Size of the header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    #[inline]
    pub fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    #[inline]
    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    /// Two-letter marker as written in the file.
    pub const fn marker(self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "II",
            ByteOrder::BigEndian => "MM",
        }
    }
}

// =============================================================================
// FileHeader
// =============================================================================

/// Parsed container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Magic value; 42 for a well-formed file
    pub magic: u16,

    /// Offset to the first directory in the file
    pub first_directory_offset: u32,
}

impl FileHeader {
    /// Parse a header from raw bytes.
    ///
    /// # Errors
    /// - `UnknownByteOrder` if the first two bytes are not II or MM
    /// - `TruncatedRead` if there are fewer than 8 bytes
    /// - `BadMagic` if the magic is not 42. The error carries the parsed
    ///   header so the caller may still follow `first_directory_offset`.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < 2 {
            return Err(FormatError::TruncatedRead {
                offset: 0,
                requested: TIFF_HEADER_SIZE as u64,
                available: bytes.len() as u64,
            });
        }

        // Compared as raw byte patterns, so the order used here is irrelevant
        let marker = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match marker {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(FormatError::UnknownByteOrder(marker)),
        };

        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(FormatError::TruncatedRead {
                offset: 0,
                requested: TIFF_HEADER_SIZE as u64,
                available: bytes.len() as u64,
            });
        }

        let header = FileHeader {
            byte_order,
            magic: byte_order.read_u16(&bytes[2..4]),
            first_directory_offset: byte_order.read_u32(&bytes[4..8]),
        };

        if header.magic != TIFF_MAGIC {
            return Err(FormatError::BadMagic {
                found: header.magic,
                header,
            });
        }

        Ok(header)
    }

    /// Read and parse the header at the start of `reader`.
    pub fn read<R: RangeReader + ?Sized>(reader: &R) -> Result<Self, FormatError> {
        let len = std::cmp::min(reader.size(), TIFF_HEADER_SIZE as u64) as usize;
        let bytes = reader.read_exact_at(0, len)?;
        Self::parse(&bytes)
    }

    /// Accept a `BadMagic` header, passing every other outcome through.
    ///
    /// Returns the header and, when recovery happened, the error that was
    /// swallowed so the caller can report it.
    pub fn recover(
        result: Result<Self, FormatError>,
    ) -> Result<(Self, Option<FormatError>), FormatError> {
        match result {
            Ok(header) => Ok((header, None)),
            Err(err @ FormatError::BadMagic { header, .. }) => Ok((header, Some(err))),
            Err(err) => Err(err),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Field type and tag definitions for TIFF-derived containers.
//!
//! This module defines the vocabulary shared by every directory in the file:
//! - Field types that determine how values are encoded
//! - Standard and Exif tag IDs that identify metadata fields
//!
//! Vendor tags live with the vendor code in `format::arw::tags`.

// =============================================================================
// Field Types
// =============================================================================

/// Field types that determine how values are encoded.
///
/// Each type has a fixed per-element width, which decides whether a value
/// is stored inside its record or at an offset elsewhere in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte = 1,

    /// 8-bit ASCII character, NUL terminated
    Ascii = 2,

    /// Unsigned 16-bit integer
    Short = 3,

    /// Unsigned 32-bit integer
    Long = 4,

    /// Two unsigned 32-bit integers (numerator, denominator)
    Rational = 5,

    /// Opaque byte data
    Undefined = 7,

    /// Signed 16-bit integer
    SShort = 8,

    /// Signed 32-bit integer
    SLong = 9,

    /// Two signed 32-bit integers (numerator, denominator)
    SRational = 10,
}

impl FieldType {
    /// Bytes stored inline in a record's value field.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Size of a single element of this type in bytes.
    #[inline]
    pub const fn byte_width(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong => 4,
            FieldType::Rational | FieldType::SRational => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown type values; the directory parser keeps
    /// such records as `DecodedValue::Unknown` instead of failing.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Total byte length of `count` elements, or `None` on overflow.
    #[inline]
    pub fn total_len(self, count: u32) -> Option<u64> {
        (self.byte_width() as u64).checked_mul(count as u64)
    }

    /// Check if `count` elements of this type fit in the 4-byte value field.
    #[inline]
    pub fn fits_inline(self, count: u32) -> bool {
        self.total_len(count)
            .is_some_and(|len| len <= Self::INLINE_THRESHOLD as u64)
    }

    pub const fn name(self) -> &'static str {
        match self {
            FieldType::Byte => "BYTE",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "SHORT",
            FieldType::Long => "LONG",
            FieldType::Rational => "RATIONAL",
            FieldType::Undefined => "UNDEFINED",
            FieldType::SShort => "SSHORT",
            FieldType::SLong => "SLONG",
            FieldType::SRational => "SRATIONAL",
        }
    }

    /// All supported field types, in numeric order.
    pub const ALL: [FieldType; 9] = [
        FieldType::Byte,
        FieldType::Ascii,
        FieldType::Short,
        FieldType::Long,
        FieldType::Rational,
        FieldType::Undefined,
        FieldType::SShort,
        FieldType::SLong,
        FieldType::SRational,
    ];
}

// =============================================================================
// Standard Tags
// =============================================================================

/// Standard and Exif tag IDs read by the locator.
///
/// Tags not listed here are still parsed and kept in their directory; they
/// simply have no name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    // -------------------------------------------------------------------------
    // Basic Image Structure
    // -------------------------------------------------------------------------
    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Bits per sample
    BitsPerSample = 258,

    /// Compression scheme used
    Compression = 259,

    /// Camera manufacturer
    Make = 271,

    /// Camera model
    Model = 272,

    /// Byte offsets of strips
    StripOffsets = 273,

    /// Image orientation
    Orientation = 274,

    /// Row count per strip
    RowsPerStrip = 278,

    /// Byte counts of strips
    StripByteCounts = 279,

    /// Firmware or software name
    Software = 305,

    /// File modification date
    DateTime = 306,

    // -------------------------------------------------------------------------
    // Sub-directory Pointers
    // -------------------------------------------------------------------------
    /// Offsets of child directories (the raw image lives in one of them)
    SubIfds = 330,

    /// Offset of the Exif directory
    ExifIfd = 34665,

    /// Offset of the GPS directory
    GpsIfd = 34853,

    // -------------------------------------------------------------------------
    // Thumbnail
    // -------------------------------------------------------------------------
    /// Offset of an embedded JPEG stream
    JpegInterchangeFormat = 513,

    /// Length of the embedded JPEG stream
    JpegInterchangeFormatLength = 514,

    // -------------------------------------------------------------------------
    // Color Filter Array
    // -------------------------------------------------------------------------
    /// Dimensions of the repeating CFA tile
    CfaRepeatPatternDim = 33421,

    /// CFA colors, one byte per site of the repeating tile
    CfaPattern2 = 33422,

    /// Crop size suggested for rendering
    DefaultCropSize = 50720,

    // -------------------------------------------------------------------------
    // Exif
    // -------------------------------------------------------------------------
    /// Exposure time in seconds (rational)
    ExposureTime = 33434,

    /// Aperture as an f-number (rational)
    FNumber = 33437,

    /// ISO sensitivity
    IsoSpeedRatings = 34855,

    /// Capture time
    DateTimeOriginal = 36867,

    /// Focal length in millimetres (rational)
    FocalLength = 37386,

    /// Lens model name
    LensModel = 42036,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    ///
    /// Returns `None` for unrecognized tags. Unknown tags are not an error.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            271 => Some(TiffTag::Make),
            272 => Some(TiffTag::Model),
            273 => Some(TiffTag::StripOffsets),
            274 => Some(TiffTag::Orientation),
            278 => Some(TiffTag::RowsPerStrip),
            279 => Some(TiffTag::StripByteCounts),
            305 => Some(TiffTag::Software),
            306 => Some(TiffTag::DateTime),
            330 => Some(TiffTag::SubIfds),
            513 => Some(TiffTag::JpegInterchangeFormat),
            514 => Some(TiffTag::JpegInterchangeFormatLength),
            33421 => Some(TiffTag::CfaRepeatPatternDim),
            33422 => Some(TiffTag::CfaPattern2),
            33434 => Some(TiffTag::ExposureTime),
            33437 => Some(TiffTag::FNumber),
            34665 => Some(TiffTag::ExifIfd),
            34853 => Some(TiffTag::GpsIfd),
            34855 => Some(TiffTag::IsoSpeedRatings),
            36867 => Some(TiffTag::DateTimeOriginal),
            37386 => Some(TiffTag::FocalLength),
            42036 => Some(TiffTag::LensModel),
            50720 => Some(TiffTag::DefaultCropSize),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether the tag's value is the offset of one or more child directories.
    pub const fn is_sub_directory(self) -> bool {
        matches!(self, TiffTag::SubIfds | TiffTag::ExifIfd | TiffTag::GpsIfd)
    }
}

// =============================================================================
// Compression Values
// =============================================================================

/// Compression scheme identifiers seen in raw containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    /// No compression
    None = 1,

    /// "Old-style" JPEG, used by some preview directories
    OldJpeg = 6,

    /// JPEG, used by thumbnails and lossless raw variants
    Jpeg = 7,

    /// Vendor-packed raw data
    SonyArw = 32767,
}

impl Compression {
    /// Create a Compression from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Compression::None),
            6 => Some(Compression::OldJpeg),
            7 => Some(Compression::Jpeg),
            32767 => Some(Compression::SonyArw),
            _ => None,
        }
    }

    /// Get a human-readable name for the compression scheme.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::OldJpeg => "Old JPEG",
            Compression::Jpeg => "JPEG",
            Compression::SonyArw => "Sony ARW",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

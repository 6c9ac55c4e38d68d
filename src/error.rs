use thiserror::Error;

use crate::format::tiff::FileHeader;

/// I/O errors raised by byte sources.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Underlying read failed (file system error, poisoned lock, ...)
    #[error("Read error: {0}")]
    Read(String),
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        IoError::Read(err.to_string())
    }
}

/// Errors raised while decoding an ARW/TIFF container.
///
/// Structural errors abort the decode path that raised them. Optional lookups
/// that fail are reported as absent values by the asset locator instead.
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(IoError),

    /// The first two bytes are neither "II" nor "MM"
    #[error("Unknown byte order marker: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    UnknownByteOrder(u16),

    /// The magic value after the byte order marker is not 42.
    ///
    /// The header is still returned so callers can attempt recovery.
    #[error("Bad magic: expected 42, got {found}")]
    BadMagic { found: u16, header: FileHeader },

    /// Fewer bytes are available than a field declares
    #[error("Truncated read: requested {requested} bytes at offset {offset}, only {available} available")]
    TruncatedRead {
        offset: u64,
        requested: u64,
        available: u64,
    },

    /// A count or length field implies an allocation above the configured ceiling
    #[error("Unreasonable length for {what}: {requested} bytes exceeds limit of {limit}")]
    UnreasonableLength {
        what: &'static str,
        requested: u64,
        limit: u64,
    },

    /// A record carries a field type outside the known set.
    ///
    /// Non-fatal: the value is kept as `DecodedValue::Unknown` and the
    /// locator reports one of these per such record.
    #[error("Unknown field type {field_type} on tag 0x{tag:04X}")]
    UnknownFieldType { tag: u16, field_type: u16 },

    /// The decrypted SR2 region does not parse as a directory
    #[error("SR2 decryption produced an unusable directory: {reason}")]
    CipherIntegrityFailure { reason: String },

    /// The block codec mapping is not pinned for this codec variant
    #[error("Codec variant {variant} has no known sample reconstruction")]
    UnderdeterminedCodec { variant: String },

    /// A directory offset was visited twice
    #[error("Directory cycle detected at offset {offset}")]
    DirectoryCycle { offset: u32 },

    /// The directory walk exceeded its step ceiling
    #[error("Too many directories: walk stopped after {limit}")]
    TooManyDirectories { limit: usize },

    /// Required tag is missing from a directory
    #[error("Missing required tag: {0}")]
    MissingTag(&'static str),

    /// Tag has unexpected type, count or value
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },
}

impl FormatError {
    /// True for errors that leave the rest of the decode usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FormatError::BadMagic { .. }
                | FormatError::UnknownFieldType { .. }
                | FormatError::CipherIntegrityFailure { .. }
        )
    }
}

impl From<IoError> for FormatError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::RangeOutOfBounds {
                offset,
                requested,
                size,
            } => FormatError::TruncatedRead {
                offset,
                requested,
                available: size.saturating_sub(offset),
            },
            other => FormatError::Io(other),
        }
    }
}

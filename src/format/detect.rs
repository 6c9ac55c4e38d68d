//! Container detection.
//!
//! Raw files share the TIFF header with every other TIFF, so the header
//! alone only says "TIFF". The vendor is identified from the first
//! directory:
//!
//! - **Sony ARW**: `Make` starts with "SONY" and the directory carries either
//!   `DNGPrivateData` or `SonyRawFileType`
//! - **Generic TIFF**: anything else with a valid header

use serde::Serialize;

use crate::error::FormatError;
use crate::io::RangeReader;

use super::arw::SonyTag;
use super::tiff::{Directory, FileHeader, TiffTag, TIFF_HEADER_SIZE};

// =============================================================================
// ContainerKind
// =============================================================================

/// Detected container kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContainerKind {
    /// Sony ARW raw file
    SonyArw,

    /// Any other TIFF-structured file
    GenericTiff,
}

impl ContainerKind {
    /// Get a human-readable name for the container.
    pub const fn name(&self) -> &'static str {
        match self {
            ContainerKind::SonyArw => "Sony ARW",
            ContainerKind::GenericTiff => "Generic TIFF",
        }
    }
}

// =============================================================================
// Detection
// =============================================================================

/// Vendor prefix of the `Make` tag.
const SONY_MAKE_PREFIX: &str = "SONY";

/// Classify a container from its first directory.
pub fn detect_container(root: &Directory) -> ContainerKind {
    let is_sony = root
        .string_value(TiffTag::Make.as_u16())
        .is_some_and(|make| make.to_ascii_uppercase().starts_with(SONY_MAKE_PREFIX));

    let has_vendor_tags = root.contains(SonyTag::DngPrivateData.as_u16())
        || root.contains(SonyTag::SonyRawFileType.as_u16());

    if is_sony && has_vendor_tags {
        ContainerKind::SonyArw
    } else {
        ContainerKind::GenericTiff
    }
}

/// Quick check whether bytes start with a valid header (byte order marker
/// and magic 42).
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    FileHeader::parse(bytes).is_ok()
}

/// Read the start of `reader` and check for a header.
pub fn probe<R: RangeReader + ?Sized>(reader: &R) -> Result<bool, FormatError> {
    if reader.size() < TIFF_HEADER_SIZE as u64 {
        return Ok(false);
    }
    let bytes = reader.read_exact_at(0, TIFF_HEADER_SIZE)?;
    Ok(is_tiff_header(&bytes))
}

// =============================================================================
// Tests
// =============================================================================

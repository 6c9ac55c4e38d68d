//! Per-decode context.
//!
//! A [`DecodeSession`] owns one byte source, the header parsed from it and
//! the limits it runs under. The byte order lives in the header, so two
//! sessions over different files never share parsing state and can run on
//! separate threads.

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::DecodeLimits;
use crate::error::FormatError;
use crate::format::arw::{self, LocatedAssets, ThumbnailLocation};
use crate::format::tiff::{parse_directory, walk_chain, ByteOrder, Chain, Directory, FileHeader, VisitGuard};
use crate::io::{BlockCache, ByteCursor, FileReader, RangeReader};

/// One decode of one file.
pub struct DecodeSession<R> {
    reader: R,
    header: FileHeader,
    limits: DecodeLimits,

    /// `BadMagic` accepted while opening, reported again by [`Self::locate`].
    header_issue: Option<FormatError>,
}

impl DecodeSession<BlockCache<FileReader>> {
    /// Open a local file behind a block cache.
    pub fn open_path(path: impl AsRef<Path>, limits: DecodeLimits) -> Result<Self, FormatError> {
        let reader = BlockCache::new(FileReader::open(path)?);
        Self::open(reader, limits)
    }
}

impl<R: RangeReader> DecodeSession<R> {
    /// Parse the header and start a session.
    ///
    /// A header whose magic is not 42 is accepted: the byte order and first
    /// offset are still used, and the problem is reported as an issue.
    ///
    /// # Errors
    /// `UnknownByteOrder` or `TruncatedRead` if the header itself is unusable.
    pub fn open(reader: R, limits: DecodeLimits) -> Result<Self, FormatError> {
        let (header, header_issue) = FileHeader::recover(FileHeader::read(&reader))?;
        if let Some(issue) = &header_issue {
            warn!(source = reader.identifier(), error = %issue, "Recovering from bad header magic");
        }
        debug!(
            source = reader.identifier(),
            byte_order = header.byte_order.marker(),
            first_directory = header.first_directory_offset,
            "Opened decode session"
        );

        Ok(Self {
            reader,
            header,
            limits,
            header_issue,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Header recovery problem, if any.
    pub fn header_issue(&self) -> Option<&FormatError> {
        self.header_issue.as_ref()
    }

    /// A fresh cursor over the source in the session byte order.
    pub fn cursor(&self) -> ByteCursor<'_, R> {
        ByteCursor::new(&self.reader, self.header.byte_order)
    }

    /// Parse a single directory. No cycle tracking.
    pub fn directory(&self, offset: u32) -> Result<Directory, FormatError> {
        parse_directory(&mut self.cursor(), offset, &self.limits)
    }

    /// Walk the main chain from the header.
    pub fn chain(&self) -> Result<Chain, FormatError> {
        let mut guard = VisitGuard::from_limits(&self.limits);
        walk_chain(
            &mut self.cursor(),
            self.header.first_directory_offset,
            &mut guard,
            &self.limits,
        )
    }

    /// Run the asset locator.
    pub fn locate(&self) -> Result<LocatedAssets, FormatError> {
        let mut assets = arw::locate(&self.reader, &self.header, &self.limits)?;
        if let Some(issue) = &self.header_issue {
            assets.issues.insert(0, issue.clone());
        }
        Ok(assets)
    }

    /// Decode the sensor strip found by [`Self::locate`].
    ///
    /// # Errors
    /// `MissingTag` when no raw directory was found, plus everything
    /// [`arw::decode_samples`] returns.
    pub fn decode_samples(&self, assets: &LocatedAssets) -> Result<Vec<u16>, FormatError> {
        let variant = assets
            .codec
            .ok_or(FormatError::MissingTag("SonyRawFileType"))?;
        arw::decode_samples(
            &self.reader,
            self.header.byte_order,
            &assets.geometry,
            variant,
            &self.limits,
        )
    }

    /// Read a byte range, bounded by the allocation limit.
    pub fn read_range(&self, offset: u64, length: u64) -> Result<Bytes, FormatError> {
        self.limits.check_allocation("byte range", length)?;
        Ok(self.reader.read_exact_at(offset, length as usize)?)
    }

    /// Bytes of an embedded JPEG, unchanged.
    pub fn thumbnail_bytes(&self, location: &ThumbnailLocation) -> Result<Bytes, FormatError> {
        self.read_range(location.offset as u64, location.length as u64)
    }
}

// =============================================================================
// Tests
// =============================================================================

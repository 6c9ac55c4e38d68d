//! # ARW Reader
//!
//! A decoder for Sony ARW raw containers.
//!
//! An ARW file is a TIFF-structured container: a chain of tag directories
//! describing previews and metadata, a raw image directory hung off
//! `SubIFDs`, and a vendor private block whose SR2 region is encrypted with
//! a simple stream cipher. This crate walks that structure, decrypts the SR2
//! region, and decodes the sensor strip into a flat `u16` sample array.
//!
//! ## Architecture
//!
//! - [`io`] - byte sources, a block cache and the positioned cursor
//! - [`mod@format`] - the container parser and the Sony layer on top of it
//! - [`session`] - the per-decode context carrying byte order and limits
//! - [`config`] - decode limits and the CLI surface
//! - [`error`] - error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use arw_reader::{DecodeLimits, DecodeSession};
//!
//! # fn main() -> Result<(), arw_reader::FormatError> {
//! let session = DecodeSession::open_path("DSC00001.ARW", DecodeLimits::default())?;
//! let assets = session.locate()?;
//!
//! println!("{:?} x {:?}", assets.geometry.width, assets.geometry.height);
//! if let Some(thumb) = assets.largest_thumbnail() {
//!     let jpeg = session.thumbnail_bytes(thumb)?;
//!     println!("thumbnail: {} bytes", jpeg.len());
//! }
//! let samples = session.decode_samples(&assets)?;
//! println!("{} samples", samples.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod io;
pub mod session;

// Re-export commonly used types
pub use config::{Cli, Command, DecodeLimits, DEFAULT_MAX_ALLOCATION, DEFAULT_MAX_DIRECTORIES};
pub use error::{FormatError, IoError};
pub use format::arw::{
    AssetReport, CfaPattern, CodecVariant, ExposureInfo, LocatedAssets, RawSampleGeometry,
    SonyTag, ThumbnailLocation,
};
pub use format::tiff::{
    ByteOrder, DecodedValue, Directory, FieldType, FileHeader, TagRecord, TiffTag,
    TIFF_HEADER_SIZE,
};
pub use format::{detect_container, is_tiff_header, ContainerKind};
pub use io::{BlockCache, FileReader, MemoryReader, RangeReader};
pub use session::DecodeSession;

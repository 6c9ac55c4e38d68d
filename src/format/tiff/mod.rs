//! Parser for the TIFF-derived container that raw files are built on.
//!
//! # Key Concepts
//!
//! - **Byte order**: the header declares its endianness (II = little-endian,
//!   MM = big-endian). The order is part of the parsed [`FileHeader`] and is
//!   passed along explicitly; there is no global byte-order state.
//!
//! - **Directory**: a list of typed tag records plus a link to the next
//!   directory. Raw files chain a preview directory to a thumbnail directory
//!   and hang the sensor data off `SubIFDs`.
//!
//! - **Inline vs offset values**: values of up to 4 bytes live in the record,
//!   larger ones at an absolute offset. The choice depends only on type and
//!   count, never on the tag.

mod directory;
mod parser;
mod tags;
mod values;
mod walk;

pub use directory::{parse_directory, Directory, DirectoryEntry, TagRecord, RECORD_SIZE};
pub use parser::{ByteOrder, FileHeader, TIFF_HEADER_SIZE, TIFF_MAGIC};
pub use tags::{Compression, FieldType, TiffTag};
pub use values::DecodedValue;
pub use walk::{parse_sub_directories, walk_chain, Chain, VisitGuard};

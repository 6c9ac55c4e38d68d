//! Sony ARW layer on top of the TIFF container.
//!
//! The container parser knows nothing about Sony. This module adds the
//! vendor tag IDs, the SR2 cipher, the 16-sample block codec and the asset
//! locator that ties them to a parsed directory tree.

mod bits;
pub mod cipher;
pub mod codec;
pub mod geometry;
pub mod locator;
pub mod strip;
mod tags;

pub use bits::{BlockBits, BlockWriter, BLOCK_BITS, BLOCK_BYTES};
pub use cipher::{derive_key, CipherKeyMaterial};
pub use codec::{decode_block, decode_block_with, scaled_offset, CodecVariant, DeltaRule, RawBlock};
pub use geometry::{CfaPattern, ExposureInfo, RawSampleGeometry, ThumbnailLocation};
pub use locator::{locate, AssetReport, LocatedAssets, RawDirectory};
pub use strip::decode_samples;
pub use tags::SonyTag;

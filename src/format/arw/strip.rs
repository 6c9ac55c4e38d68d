//! Sensor strip decoding into a flat, row-major `u16` sample array.

use tracing::debug;

use crate::config::DecodeLimits;
use crate::error::FormatError;
use crate::format::tiff::ByteOrder;
use crate::io::RangeReader;

use super::bits::BLOCK_BYTES;
use super::codec::{CodecVariant, DeltaMapping, RawBlock, SAMPLES_PER_BLOCK};
use super::geometry::RawSampleGeometry;

/// Compose samples from byte pairs in the file's byte order.
///
/// A trailing odd byte is ignored.
pub fn decode_uncompressed(bytes: &[u8], byte_order: ByteOrder) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| byte_order.read_u16(pair))
        .collect()
}

/// Decode block-coded rows. Each row is `width` bytes holding `width / 16`
/// blocks of 16 samples.
pub fn decode_compressed(
    bytes: &[u8],
    width: usize,
    height: usize,
    mapping: DeltaMapping,
) -> Result<Vec<u16>, FormatError> {
    if width % SAMPLES_PER_BLOCK != 0 {
        return Err(FormatError::InvalidTagValue {
            tag: "ImageWidth",
            message: format!("{} is not a multiple of {}", width, SAMPLES_PER_BLOCK),
        });
    }
    let needed = width * height;
    if bytes.len() < needed {
        return Err(FormatError::TruncatedRead {
            offset: 0,
            requested: needed as u64,
            available: bytes.len() as u64,
        });
    }

    let mut samples = Vec::with_capacity(needed);
    let mut block = [0u8; BLOCK_BYTES];
    for chunk in bytes[..needed].chunks_exact(BLOCK_BYTES) {
        block.copy_from_slice(chunk);
        samples.extend_from_slice(&RawBlock::parse(&block).reconstruct(mapping));
    }
    Ok(samples)
}

/// Read the strip described by `geometry` and decode it.
///
/// # Errors
/// - `MissingTag` if width, height or strip offset are absent
/// - `UnreasonableLength` if the input or output exceeds the allocation limit
/// - `UnderdeterminedCodec` for variants without a known decoder
/// - `InvalidTagValue` if `StripByteCounts` is shorter than the geometry needs
/// - `TruncatedRead` if the strip runs past the end of the file
pub fn decode_samples<R: RangeReader + ?Sized>(
    reader: &R,
    byte_order: ByteOrder,
    geometry: &RawSampleGeometry,
    variant: CodecVariant,
    limits: &DecodeLimits,
) -> Result<Vec<u16>, FormatError> {
    let width = geometry.width.ok_or(FormatError::MissingTag("ImageWidth"))? as u64;
    let height = geometry.height.ok_or(FormatError::MissingTag("ImageLength"))? as u64;
    let offset = geometry
        .strip_offset
        .ok_or(FormatError::MissingTag("StripOffsets"))? as u64;

    let sample_count = width * height;
    limits.check_allocation("sample array", sample_count * 2)?;

    let input_len = match variant {
        CodecVariant::Uncompressed14 | CodecVariant::Uncompressed12 => sample_count * 2,
        CodecVariant::CompressedRaw => sample_count,
        other => {
            return Err(FormatError::UnderdeterminedCodec {
                variant: other.name(),
            })
        }
    };
    limits.check_allocation("raw strip", input_len)?;

    if let Some(strip_length) = geometry.strip_length {
        if (strip_length as u64) < input_len {
            return Err(FormatError::InvalidTagValue {
                tag: "StripByteCounts",
                message: format!(
                    "strip holds {} bytes, {}x{} {} needs {}",
                    strip_length,
                    width,
                    height,
                    variant.name(),
                    input_len
                ),
            });
        }
    }

    debug!(
        width,
        height,
        offset,
        variant = %variant.name(),
        "Decoding sensor strip"
    );

    let bytes = reader.read_exact_at(offset, input_len as usize)?;

    match variant {
        CodecVariant::CompressedRaw => {
            let mapping = variant.delta_rule()?.mapping();
            decode_compressed(&bytes, width as usize, height as usize, mapping)
        }
        _ => Ok(decode_uncompressed(&bytes, byte_order)),
    }
}

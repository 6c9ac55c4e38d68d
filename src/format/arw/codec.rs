//! Compressed-raw block codec.
//!
//! Each 16-byte block holds 16 consecutive samples of one sensor row:
//!
//! ```text
//! max (11) | min (11) | max_offset (4) | min_offset (4) | 14 x delta (7)
//! ```
//!
//! `max` and `min` are stored literally at sample positions `max_offset`
//! and `min_offset`. The other 14 positions are filled in index order from
//! the delta codes. Turning a code into a sample is done by a single
//! [`DeltaMapping`] function, so the bit layout and the arithmetic can be
//! checked and corrected independently.
//!
//! The only mapping shipped is [`scaled_offset`], the arithmetic of the ARW2
//! decoder in dnglab. That decoder reads its bit stream LSB-first and writes
//! two blocks interleaved into 32 pixels; here fields are read MSB-first and
//! a block fills 16 consecutive samples. The combination has not been
//! compared against reference pixels from a camera.

use crate::error::FormatError;

use super::bits::{BlockBits, BlockWriter, BLOCK_BYTES};

/// Samples decoded from one block.
pub const SAMPLES_PER_BLOCK: usize = 16;

/// Delta codes per block.
pub const DELTA_COUNT: usize = 14;

/// Largest sample value an 11-bit field can carry.
pub const SAMPLE_MAX: u16 = 0x7FF;

const VALUE_BITS: u32 = 11;
const OFFSET_BITS: u32 = 4;
const DELTA_BITS: u32 = 7;

/// Field widths in stream order; they add up to the 128-bit block.
pub const FIELD_WIDTHS: [u32; 4 + DELTA_COUNT] = [
    VALUE_BITS,
    VALUE_BITS,
    OFFSET_BITS,
    OFFSET_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
    DELTA_BITS,
];

// =============================================================================
// RawBlock
// =============================================================================

/// The fields of one block, before any sample reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBlock {
    pub max: u16,
    pub min: u16,
    pub max_offset: u8,
    pub min_offset: u8,
    pub deltas: [u8; DELTA_COUNT],
}

impl RawBlock {
    pub fn parse(block: &[u8; BLOCK_BYTES]) -> Self {
        let mut bits = BlockBits::new(block);
        let max = bits.take(VALUE_BITS) as u16;
        let min = bits.take(VALUE_BITS) as u16;
        let max_offset = bits.take(OFFSET_BITS) as u8;
        let min_offset = bits.take(OFFSET_BITS) as u8;
        let mut deltas = [0u8; DELTA_COUNT];
        for delta in deltas.iter_mut() {
            *delta = bits.take(DELTA_BITS) as u8;
        }
        Self {
            max,
            min,
            max_offset,
            min_offset,
            deltas,
        }
    }

    /// Pack the fields back into a block. Out-of-range values are masked.
    pub fn pack(&self) -> [u8; BLOCK_BYTES] {
        let mut writer = BlockWriter::new();
        writer
            .put(self.max as u32, VALUE_BITS)
            .put(self.min as u32, VALUE_BITS)
            .put(self.max_offset as u32, OFFSET_BITS)
            .put(self.min_offset as u32, OFFSET_BITS);
        for &delta in &self.deltas {
            writer.put(delta as u32, DELTA_BITS);
        }
        writer.finish()
    }

    /// Expand into samples with `mapping`.
    ///
    /// When both offsets name the same position, the maximum is stored
    /// there and the fifteenth remaining position receives code 0.
    pub fn reconstruct(&self, mapping: DeltaMapping) -> [u16; SAMPLES_PER_BLOCK] {
        let mut out = [0u16; SAMPLES_PER_BLOCK];
        let mut codes = self.deltas.iter().copied();
        for (i, sample) in out.iter_mut().enumerate() {
            *sample = if i == self.max_offset as usize {
                self.max
            } else if i == self.min_offset as usize {
                self.min
            } else {
                mapping(codes.next().unwrap_or(0), self.min, self.max)
            };
        }
        out
    }
}

// =============================================================================
// Delta Mapping
// =============================================================================

/// Maps a 7-bit delta code and the block's literal min/max to a sample.
pub type DeltaMapping = fn(code: u8, min: u16, max: u16) -> u16;

/// Codes scaled by the block's dynamic range, added to `min`.
///
/// The shift is the number of bits `max - min` needs beyond seven, so a
/// full 11-bit range is covered in steps of 16. Results are clamped to
/// 11 bits.
pub fn scaled_offset(code: u8, min: u16, max: u16) -> u16 {
    let span = max.saturating_sub(min);
    let span_bits = u16::BITS - span.leading_zeros();
    let shift = span_bits.saturating_sub(DELTA_BITS);
    let value = ((code as u32) << shift) + min as u32;
    value.min(SAMPLE_MAX as u32) as u16
}

/// Delta reconstruction rules a codec variant can be decoded with.
///
/// Only [`DeltaRule::ScaledOffset`] exists. Its arithmetic follows dnglab's
/// ARW2 decoder; the bit order and sample placement around it do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaRule {
    /// [`scaled_offset`]
    ScaledOffset,
}

impl DeltaRule {
    pub fn mapping(self) -> DeltaMapping {
        match self {
            DeltaRule::ScaledOffset => scaled_offset,
        }
    }
}

/// Decode one block with the default rule.
pub fn decode_block(block: &[u8; BLOCK_BYTES]) -> [u16; SAMPLES_PER_BLOCK] {
    decode_block_with(block, scaled_offset)
}

/// Decode one block with an explicit mapping.
pub fn decode_block_with(block: &[u8; BLOCK_BYTES], mapping: DeltaMapping) -> [u16; SAMPLES_PER_BLOCK] {
    RawBlock::parse(block).reconstruct(mapping)
}

// =============================================================================
// CodecVariant
// =============================================================================

/// Sample encoding of a raw strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecVariant {
    /// 14-bit samples, two bytes each
    Uncompressed14,
    /// 12-bit samples, two bytes each
    Uncompressed12,
    /// 16-byte delta blocks
    CompressedRaw,
    /// Lossless JPEG tiles
    Lossless,
    Unknown(u16),
}

impl CodecVariant {
    /// Map a `SonyRawFileType` value.
    pub fn from_raw_file_type(value: u16) -> Self {
        match value {
            0 => CodecVariant::Uncompressed14,
            1 => CodecVariant::Uncompressed12,
            2 => CodecVariant::CompressedRaw,
            3 => CodecVariant::Lossless,
            other => CodecVariant::Unknown(other),
        }
    }

    /// Pick the variant for a raw directory.
    ///
    /// `SonyRawFileType` wins when present. Older bodies omit it; then the
    /// compression tag decides, with bit depth separating the uncompressed
    /// variants.
    pub fn infer(
        raw_file_type: Option<u16>,
        compression: Option<u16>,
        bits_per_sample: Option<u16>,
    ) -> Self {
        if let Some(value) = raw_file_type {
            return Self::from_raw_file_type(value);
        }
        match (compression, bits_per_sample) {
            (Some(32767), _) => CodecVariant::CompressedRaw,
            (Some(7), _) => CodecVariant::Lossless,
            (Some(1), Some(12)) => CodecVariant::Uncompressed12,
            (Some(1), _) => CodecVariant::Uncompressed14,
            (Some(other), _) => CodecVariant::Unknown(other),
            (None, _) => CodecVariant::Unknown(0),
        }
    }

    /// Significant bits per decoded sample.
    pub fn bit_depth(self) -> Option<u16> {
        match self {
            CodecVariant::Uncompressed14 | CodecVariant::Lossless => Some(14),
            CodecVariant::Uncompressed12 => Some(12),
            CodecVariant::CompressedRaw => Some(11),
            CodecVariant::Unknown(_) => None,
        }
    }

    /// The delta rule for block-coded variants.
    ///
    /// # Errors
    /// `UnderdeterminedCodec` for variants with no known reconstruction.
    pub fn delta_rule(self) -> Result<DeltaRule, FormatError> {
        match self {
            CodecVariant::CompressedRaw => Ok(DeltaRule::ScaledOffset),
            other => Err(FormatError::UnderdeterminedCodec {
                variant: other.name(),
            }),
        }
    }

    pub fn name(self) -> String {
        match self {
            CodecVariant::Uncompressed14 => "uncompressed 14-bit".to_string(),
            CodecVariant::Uncompressed12 => "uncompressed 12-bit".to_string(),
            CodecVariant::CompressedRaw => "compressed RAW".to_string(),
            CodecVariant::Lossless => "lossless compressed RAW".to_string(),
            CodecVariant::Unknown(value) => format!("unknown ({})", value),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

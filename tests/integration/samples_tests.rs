//! Sensor sample integration tests.

use arw_reader::format::arw::decode_block;
use arw_reader::{CodecVariant, DecodeLimits, DecodeSession, FormatError, MemoryReader};

use super::test_utils::{build_arw, compressed_strip, ArwOptions, ByteOrderType};

fn decode(options: &ArwOptions) -> Result<Vec<u16>, FormatError> {
    decode_with(options, DecodeLimits::default())
}

fn decode_with(options: &ArwOptions, limits: DecodeLimits) -> Result<Vec<u16>, FormatError> {
    let session = DecodeSession::open(MemoryReader::new(build_arw(options), "arw"), limits)?;
    let assets = session.locate()?;
    session.decode_samples(&assets)
}

// =============================================================================
// Compressed
// =============================================================================

#[test]
fn test_compressed_strip_decodes_row_major() {
    let samples = decode(&ArwOptions::compressed()).unwrap();
    assert_eq!(samples.len(), 64);

    // Each block: max at 0, min at 1, code 64 scaled by 2^3 above min
    for (block, (max, min)) in [(1000, 100), (1100, 200), (1200, 300), (1300, 400)]
        .into_iter()
        .enumerate()
    {
        let start = block * 16;
        assert_eq!(samples[start], max);
        assert_eq!(samples[start + 1], min);
        assert!(samples[start + 2..start + 16].iter().all(|&s| s == min + 512));
    }
}

#[test]
fn test_compressed_strip_matches_block_decoder() {
    let strip = compressed_strip();
    let samples = decode(&ArwOptions::compressed()).unwrap();

    for (i, chunk) in strip.chunks_exact(16).enumerate() {
        let block: [u8; 16] = chunk.try_into().unwrap();
        assert_eq!(&samples[i * 16..(i + 1) * 16], &decode_block(&block)[..]);
    }
}

#[test]
fn test_compressed_inferred_without_raw_file_type() {
    let options = ArwOptions {
        raw_file_type: None,
        ..ArwOptions::compressed()
    };
    let session =
        DecodeSession::open(MemoryReader::new(build_arw(&options), "arw"), DecodeLimits::default())
            .unwrap();
    let assets = session.locate().unwrap();

    assert_eq!(assets.codec, Some(CodecVariant::CompressedRaw));
    assert_eq!(session.decode_samples(&assets).unwrap().len(), 64);
}

#[test]
fn test_compressed_width_not_multiple_of_block() {
    let options = ArwOptions {
        width: 24,
        ..ArwOptions::compressed()
    };
    assert!(matches!(
        decode(&options),
        Err(FormatError::InvalidTagValue { tag: "ImageWidth", .. })
    ));
}

// =============================================================================
// Uncompressed
// =============================================================================

#[test]
fn test_uncompressed_both_byte_orders() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let samples = decode(&ArwOptions::uncompressed(order)).unwrap();
        assert_eq!(samples, (1000..1008).collect::<Vec<u16>>(), "{:?}", order);
    }
}

#[test]
fn test_uncompressed_12_bit_inferred_from_bit_depth() {
    let options = ArwOptions {
        raw_file_type: None,
        bits_per_sample: 12,
        ..ArwOptions::uncompressed(ByteOrderType::LittleEndian)
    };
    let session =
        DecodeSession::open(MemoryReader::new(build_arw(&options), "arw"), DecodeLimits::default())
            .unwrap();
    let assets = session.locate().unwrap();
    assert_eq!(assets.codec, Some(CodecVariant::Uncompressed12));
    assert_eq!(session.decode_samples(&assets).unwrap()[7], 1007);
}

// =============================================================================
// Refusals
// =============================================================================

#[test]
fn test_lossless_is_underdetermined() {
    let options = ArwOptions {
        raw_file_type: Some(3),
        ..ArwOptions::compressed()
    };
    assert!(matches!(
        decode(&options),
        Err(FormatError::UnderdeterminedCodec { .. })
    ));
}

#[test]
fn test_unknown_raw_file_type_is_underdetermined() {
    let options = ArwOptions {
        raw_file_type: Some(9),
        ..ArwOptions::compressed()
    };
    assert!(matches!(
        decode(&options),
        Err(FormatError::UnderdeterminedCodec { .. })
    ));
}

#[test]
fn test_sample_array_bounded_by_limit() {
    let options = ArwOptions {
        width: 6048,
        height: 4024,
        ..ArwOptions::compressed()
    };
    let limits = DecodeLimits {
        max_allocation: 1024 * 1024,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        decode_with(&options, limits),
        Err(FormatError::UnreasonableLength {
            what: "sample array",
            ..
        })
    ));
}

#[test]
fn test_strip_runs_past_end_of_file() {
    let options = ArwOptions {
        height: 100_000,
        strip_byte_count: Some(32 * 100_000),
        ..ArwOptions::compressed()
    };
    assert!(matches!(
        decode(&options),
        Err(FormatError::TruncatedRead { .. })
    ));
}

#[test]
fn test_strip_shorter_than_geometry() {
    for options in [
        ArwOptions {
            strip_byte_count: Some(48),
            ..ArwOptions::compressed()
        },
        ArwOptions {
            strip_byte_count: Some(15),
            ..ArwOptions::uncompressed(ByteOrderType::BigEndian)
        },
    ] {
        assert!(matches!(
            decode(&options),
            Err(FormatError::InvalidTagValue {
                tag: "StripByteCounts",
                ..
            })
        ));
    }
}

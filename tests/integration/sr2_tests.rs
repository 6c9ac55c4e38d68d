//! Asset locator and SR2 integration tests.
//!
//! Tests verify:
//! - A complete synthetic ARW is classified and located
//! - The SR2 region decrypts, including values stored out of line
//! - A wrong key or unreadable region becomes an issue, not a failure
//! - An SR2 length above the allocation limit is rejected

use arw_reader::format::arw::{RawDirectory, SonyTag};
use arw_reader::{CodecVariant, ContainerKind, DecodeLimits, DecodeSession, FormatError, MemoryReader};

use super::test_utils::{build_arw, ArwOptions, ByteOrderType, THUMBNAIL};

fn session(data: Vec<u8>) -> DecodeSession<MemoryReader> {
    DecodeSession::open(MemoryReader::new(data, "arw"), DecodeLimits::default()).unwrap()
}

// =============================================================================
// Full Locate
// =============================================================================

#[test]
fn test_locate_synthetic_arw() {
    let assets = session(build_arw(&ArwOptions::compressed())).locate().unwrap();

    assert_eq!(assets.kind, ContainerKind::SonyArw);
    assert!(assets.issues.is_empty(), "unexpected issues: {:?}", assets.issues);
    assert_eq!(assets.chain.len(), 2);
    assert_eq!(assets.raw_directory, Some(RawDirectory::SubDirectory(0)));
    assert!(assets.private.is_some());
    assert!(assets.exif.is_some());
    assert!(assets.gps.is_none());

    let g = &assets.geometry;
    assert_eq!(g.width, Some(32));
    assert_eq!(g.height, Some(2));
    assert_eq!(g.bit_depth, Some(12));
    assert_eq!(g.raw_file_type, Some(2));
    assert_eq!(g.strip_length, Some(64));
    assert_eq!(g.tone_curve, Some([8000, 10400, 12900, 14100, 0x3FFF]));
    assert_eq!(g.cfa_pattern.as_ref().map(|c| c.describe()).as_deref(), Some("RGGB"));
    assert_eq!(assets.codec, Some(CodecVariant::CompressedRaw));

    let e = &assets.exposure;
    assert_eq!(e.make.as_deref(), Some("SONY"));
    assert_eq!(e.model.as_deref(), Some("ILCE-7M3"));
    assert_eq!(e.lens_model.as_deref(), Some("FE 35mm F1.8"));
    assert_eq!(e.shutter_speed().as_deref(), Some("1/250"));
    assert_eq!(e.aperture(), Some(2.8));
    assert_eq!(e.iso, Some(100));
    assert_eq!(e.date_time_original.as_deref(), Some("2024:05:01 10:00:00"));
}

#[test]
fn test_sr2_overrides_applied() {
    for order in [ByteOrderType::LittleEndian, ByteOrderType::BigEndian] {
        let options = ArwOptions {
            order,
            ..ArwOptions::compressed()
        };
        let assets = session(build_arw(&options)).locate().unwrap();

        let sr2 = assets.sr2.as_ref().expect("SR2 should decrypt");
        assert_eq!(sr2.len(), 2);
        assert_eq!(
            assets.geometry.black_level,
            Some([512, 513, 514, 515]),
            "{:?}",
            order
        );
        assert_eq!(assets.geometry.white_balance, Some([2000, 1024, 1024, 1500]));
    }
}

#[test]
fn test_labelled_directories_cover_everything() {
    let assets = session(build_arw(&ArwOptions::compressed())).locate().unwrap();
    let labels: Vec<String> = assets
        .labelled_directories()
        .into_iter()
        .map(|(label, _)| label)
        .collect();
    assert_eq!(
        labels,
        vec!["IFD0", "IFD1", "SubIFD0", "Exif", "DNGPrivateData", "SR2"]
    );
}

#[test]
fn test_private_directory_records() {
    let assets = session(build_arw(&ArwOptions::compressed())).locate().unwrap();
    let private = assets.private.as_ref().unwrap();
    assert!(private.contains(SonyTag::Sr2SubIfdOffset.as_u16()));
    assert!(private.contains(SonyTag::Sr2SubIfdKey.as_u16()));
    assert!(assets.vendor_directories.is_empty());
}

// =============================================================================
// SR2 Failures
// =============================================================================

#[test]
fn test_wrong_key_is_an_integrity_issue() {
    let options = ArwOptions {
        stored_key: 0x0BADF00D,
        ..ArwOptions::compressed()
    };
    let assets = session(build_arw(&options)).locate().unwrap();

    assert!(assets.sr2.is_none());
    assert!(matches!(
        assets.issues.as_slice(),
        [FormatError::CipherIntegrityFailure { .. }]
    ));
    // Everything outside SR2 is still located
    assert_eq!(assets.geometry.width, Some(32));
    assert_eq!(assets.geometry.black_level, None);
}

#[test]
fn test_sr2_region_past_end_of_file() {
    let options = ArwOptions {
        sr2_length: Some(1_000_000),
        ..ArwOptions::compressed()
    };
    let assets = session(build_arw(&options)).locate().unwrap();

    assert!(assets.sr2.is_none());
    assert!(matches!(
        assets.issues.as_slice(),
        [FormatError::TruncatedRead { .. }]
    ));
}

#[test]
fn test_sr2_length_above_limit() {
    let options = ArwOptions {
        sr2_length: Some(10_000_000),
        ..ArwOptions::compressed()
    };
    let limits = DecodeLimits {
        max_allocation: 1_000_000,
        ..DecodeLimits::default()
    };
    let session =
        DecodeSession::open(MemoryReader::new(build_arw(&options), "arw"), limits).unwrap();

    assert!(matches!(
        session.locate(),
        Err(FormatError::UnreasonableLength {
            what: "SR2 region",
            ..
        })
    ));
}

#[test]
fn test_without_sr2() {
    let options = ArwOptions {
        with_sr2: false,
        ..ArwOptions::compressed()
    };
    let assets = session(build_arw(&options)).locate().unwrap();
    assert!(assets.sr2.is_none());
    assert!(assets.issues.is_empty());
}

// =============================================================================
// Thumbnails and Report
// =============================================================================

#[test]
fn test_thumbnail_bytes_unchanged() {
    let session = session(build_arw(&ArwOptions::compressed()));
    let assets = session.locate().unwrap();

    let thumb = assets.largest_thumbnail().unwrap();
    assert_eq!(thumb.directory_index, 1);
    assert_eq!(thumb.length as usize, THUMBNAIL.len());
    assert_eq!(&session.thumbnail_bytes(thumb).unwrap()[..], THUMBNAIL);
}

#[test]
fn test_report_serializes() {
    let assets = session(build_arw(&ArwOptions::compressed())).locate().unwrap();
    let json = serde_json::to_value(assets.report()).unwrap();

    assert_eq!(json["kind"], "SonyArw");
    assert_eq!(json["codec"], "compressed RAW");
    assert_eq!(json["geometry"]["width"], 32);
    assert_eq!(json["geometry"]["black_level"][0], 512);
    assert_eq!(json["exposure"]["model"], "ILCE-7M3");
    assert_eq!(json["sr2_decrypted"], true);
    assert_eq!(json["thumbnails"].as_array().map(Vec::len), Some(1));
}

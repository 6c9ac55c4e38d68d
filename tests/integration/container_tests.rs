//! Container-level integration tests.
//!
//! Tests verify:
//! - The reference header and single-directory layout decode as expected
//! - Both byte orders parse to the same values
//! - Self-referencing and overlong chains are stopped by the visit guard
//! - Unknown field types, truncated values and oversized counts are handled
//! - File-backed and block-cached sources behave like memory sources

use std::io::Write;

use arw_reader::{
    BlockCache, ByteOrder, DecodeLimits, DecodeSession, DecodedValue, FormatError, MemoryReader,
};

use super::test_utils::{single_directory_file, ByteOrderType, FileBuilder, IfdBuilder};

fn open(data: Vec<u8>) -> DecodeSession<MemoryReader> {
    DecodeSession::open(MemoryReader::new(data, "test"), DecodeLimits::default()).unwrap()
}

// =============================================================================
// Header and Single Directory
// =============================================================================

#[test]
fn test_reference_layout() {
    let mut data = Vec::new();
    data.extend_from_slice(b"II");
    data.extend_from_slice(&42u16.to_le_bytes());
    data.extend_from_slice(&8u32.to_le_bytes());
    data.extend_from_slice(&1u16.to_le_bytes());
    data.extend_from_slice(&0x0100u16.to_le_bytes());
    data.extend_from_slice(&4u16.to_le_bytes());
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&6048u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());

    let session = open(data);
    let header = session.header();
    assert_eq!(header.byte_order, ByteOrder::LittleEndian);
    assert_eq!(header.magic, 42);
    assert_eq!(header.first_directory_offset, 8);

    let chain = session.chain().unwrap();
    assert_eq!(chain.directories.len(), 1);
    assert!(chain.stopped_by.is_none());

    let dir = &chain.directories[0];
    assert_eq!(dir.len(), 1);
    assert_eq!(dir.value(0x0100), Some(&DecodedValue::Longs(vec![6048])));
    assert_eq!(dir.next_directory_offset, 0);
}

#[test]
fn test_byte_orders_agree() {
    let values = |order: ByteOrderType| {
        let ifd = IfdBuilder::new(order)
            .long(256, 6048)
            .short(258, 14)
            .shorts(0x7010, &[8000, 10400, 12900, 14100])
            .ascii(271, "SONY")
            .rational(33434, 1, 250);
        let session = open(single_directory_file(order, &ifd));
        let dir = session.chain().unwrap().directories.remove(0);
        (
            dir.u32_value(256),
            dir.u32_value(258),
            dir.value(0x7010).cloned(),
            dir.string_value(271),
            dir.value(33434).and_then(DecodedValue::as_rational),
        )
    };

    let le = values(ByteOrderType::LittleEndian);
    let be = values(ByteOrderType::BigEndian);
    assert_eq!(le, be);
    assert_eq!(le.0, Some(6048));
    assert_eq!(le.2, Some(DecodedValue::Shorts(vec![8000, 10400, 12900, 14100])));
    assert_eq!(le.3.as_deref(), Some("SONY"));
    assert_eq!(le.4, Some((1, 250)));
}

#[test]
fn test_bad_magic_still_walks() {
    let mut file = FileBuilder::with_magic(ByteOrderType::LittleEndian, 0x2B);
    let offset = file.directory(&IfdBuilder::new(ByteOrderType::LittleEndian).long(256, 16), 0);
    file.set_first_directory(offset);

    let session = open(file.build());
    assert!(matches!(
        session.header_issue(),
        Some(FormatError::BadMagic { found: 0x2B, .. })
    ));
    assert_eq!(session.chain().unwrap().directories.len(), 1);
}

// =============================================================================
// Chain Guard
// =============================================================================

#[test]
fn test_self_referencing_chain_is_stopped() {
    let order = ByteOrderType::LittleEndian;
    let mut file = FileBuilder::new(order);
    let ifd = IfdBuilder::new(order).long(256, 1);
    let offset = file.next_offset();
    file.data.extend(ifd.encode(offset, offset));
    file.set_first_directory(offset);

    let chain = open(file.build()).chain().unwrap();
    assert_eq!(chain.directories.len(), 1);
    assert!(matches!(
        chain.stopped_by,
        Some(FormatError::DirectoryCycle { offset: o }) if o == offset
    ));
}

#[test]
fn test_two_directory_loop_is_stopped() {
    let order = ByteOrderType::LittleEndian;
    let mut file = FileBuilder::new(order);
    let a = IfdBuilder::new(order).long(256, 1);
    let b = IfdBuilder::new(order).long(256, 2);

    let a_offset = file.next_offset();
    let b_offset = a_offset + a.directory_len() as u32;
    file.data.extend(a.encode(a_offset, b_offset));
    file.data.extend(b.encode(b_offset, a_offset));
    file.set_first_directory(a_offset);

    let chain = open(file.build()).chain().unwrap();
    assert_eq!(chain.directories.len(), 2);
    assert_eq!(chain.directories[1].u32_value(256), Some(2));
    assert!(matches!(chain.stopped_by, Some(FormatError::DirectoryCycle { .. })));
}

#[test]
fn test_long_chain_hits_step_ceiling() {
    let order = ByteOrderType::BigEndian;
    let mut file = FileBuilder::new(order);
    let mut next = 0;
    for i in 0..5 {
        next = file.directory(&IfdBuilder::new(order).long(256, i), next);
    }
    file.set_first_directory(next);

    let limits = DecodeLimits {
        max_directories: 3,
        ..DecodeLimits::default()
    };
    let session = DecodeSession::open(MemoryReader::new(file.build(), "chain"), limits).unwrap();
    let chain = session.chain().unwrap();

    assert_eq!(chain.directories.len(), 3);
    assert_eq!(chain.directories[0].u32_value(256), Some(4));
    assert!(matches!(
        chain.stopped_by,
        Some(FormatError::TooManyDirectories { limit: 3 })
    ));
}

// =============================================================================
// Malformed Records
// =============================================================================

#[test]
fn test_unknown_field_type_degrades() {
    let order = ByteOrderType::LittleEndian;
    let ifd = IfdBuilder::new(order)
        .long(256, 6048)
        .raw(0x9999, 99, 1, vec![1, 2, 3, 4]);
    let dir = open(single_directory_file(order, &ifd))
        .chain()
        .unwrap()
        .directories
        .remove(0);

    assert_eq!(dir.u32_value(256), Some(6048));
    assert_eq!(
        dir.value(0x9999),
        Some(&DecodedValue::Unknown {
            field_type: 99,
            count: 1,
            raw: [1, 2, 3, 4]
        })
    );
}

#[test]
fn test_unknown_field_type_reported_by_locate() {
    let order = ByteOrderType::LittleEndian;
    let ifd = IfdBuilder::new(order)
        .long(256, 6048)
        .raw(0x9999, 77, 1, vec![1, 2, 3, 4])
        .long(0xA000, 1);
    let session = open(single_directory_file(order, &ifd));
    let assets = session.locate().unwrap();

    let root = assets.root().unwrap();
    assert_eq!(root.len(), 3);
    assert_eq!(root.u32_value(0xA000), Some(1));
    assert!(matches!(
        assets.issues.as_slice(),
        [FormatError::UnknownFieldType {
            tag: 0x9999,
            field_type: 77
        }]
    ));
}

#[test]
fn test_truncated_out_of_line_value() {
    let order = ByteOrderType::LittleEndian;
    let ifd = IfdBuilder::new(order).longs(0x0111, &[1, 2, 3, 4]);
    let mut data = single_directory_file(order, &ifd);
    data.truncate(data.len() - 8);

    assert!(matches!(
        open(data).chain(),
        Err(FormatError::TruncatedRead { .. })
    ));
}

#[test]
fn test_oversized_count_is_rejected_before_allocating() {
    let order = ByteOrderType::LittleEndian;
    let ifd = IfdBuilder::new(order).raw(0x0111, 4, 100_000_000, vec![0; 4]);

    assert!(matches!(
        open(single_directory_file(order, &ifd)).chain(),
        Err(FormatError::UnreasonableLength {
            what: "tag value",
            ..
        })
    ));
}

#[test]
fn test_missing_first_directory() {
    let mut file = FileBuilder::new(ByteOrderType::LittleEndian);
    file.set_first_directory(4096);
    assert!(matches!(
        open(file.build()).chain(),
        Err(FormatError::TruncatedRead { .. })
    ));
}

// =============================================================================
// Byte Sources
// =============================================================================

#[test]
fn test_block_cache_serves_straddling_reads() {
    let order = ByteOrderType::LittleEndian;
    let ifd = IfdBuilder::new(order)
        .longs(0x0111, &[10, 20, 30, 40, 50])
        .ascii(271, "SONY");
    let data = single_directory_file(order, &ifd);

    let reader = BlockCache::with_capacity(MemoryReader::new(data, "cached"), 7, 2);
    let session = DecodeSession::open(reader, DecodeLimits::default()).unwrap();
    let dir = session.chain().unwrap().directories.remove(0);

    assert_eq!(dir.value(0x0111), Some(&DecodedValue::Longs(vec![10, 20, 30, 40, 50])));
    assert_eq!(dir.string_value(271).as_deref(), Some("SONY"));
}

#[test]
fn test_file_backed_session() {
    let order = ByteOrderType::BigEndian;
    let ifd = IfdBuilder::new(order).long(256, 6048).long(257, 4024);
    let data = single_directory_file(order, &ifd);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let session = DecodeSession::open_path(file.path(), DecodeLimits::default()).unwrap();
    assert_eq!(session.byte_order(), ByteOrder::BigEndian);
    let dir = session.chain().unwrap().directories.remove(0);
    assert_eq!(dir.u32_value(257), Some(4024));
}

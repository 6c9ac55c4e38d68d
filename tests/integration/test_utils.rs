//! Test utilities for integration tests.
//!
//! Builders for synthetic TIFF and ARW files. Every offset is computed while
//! the file is assembled, so tests can describe a layout without counting
//! bytes by hand.

use arw_reader::format::arw::cipher;
use arw_reader::format::arw::{derive_key, RawBlock};

// =============================================================================
// Byte Order
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

impl ByteOrderType {
    pub fn u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrderType::LittleEndian => value.to_le_bytes(),
            ByteOrderType::BigEndian => value.to_be_bytes(),
        }
    }

    pub fn u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrderType::LittleEndian => value.to_le_bytes(),
            ByteOrderType::BigEndian => value.to_be_bytes(),
        }
    }
}

// =============================================================================
// Directory Builder
// =============================================================================

struct EntryBuilder {
    tag: u16,
    field_type: u16,
    count: u32,
    /// Value bytes, already in file byte order.
    payload: Vec<u8>,
}

/// Builder for one tag directory.
pub struct IfdBuilder {
    order: ByteOrderType,
    entries: Vec<EntryBuilder>,
}

impl IfdBuilder {
    pub fn new(order: ByteOrderType) -> Self {
        Self {
            order,
            entries: Vec::new(),
        }
    }

    /// Add a record with a raw payload.
    pub fn raw(mut self, tag: u16, field_type: u16, count: u32, payload: Vec<u8>) -> Self {
        self.entries.push(EntryBuilder {
            tag,
            field_type,
            count,
            payload,
        });
        self
    }

    pub fn short(self, tag: u16, value: u16) -> Self {
        self.shorts(tag, &[value])
    }

    pub fn shorts(self, tag: u16, values: &[u16]) -> Self {
        let payload = values.iter().flat_map(|&v| self.order.u16(v)).collect();
        self.raw(tag, 3, values.len() as u32, payload)
    }

    pub fn long(self, tag: u16, value: u32) -> Self {
        self.longs(tag, &[value])
    }

    pub fn longs(self, tag: u16, values: &[u32]) -> Self {
        let payload = values.iter().flat_map(|&v| self.order.u32(v)).collect();
        self.raw(tag, 4, values.len() as u32, payload)
    }

    pub fn ascii(self, tag: u16, text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        let count = payload.len() as u32;
        self.raw(tag, 2, count, payload)
    }

    pub fn bytes(self, tag: u16, values: &[u8]) -> Self {
        self.raw(tag, 1, values.len() as u32, values.to_vec())
    }

    pub fn undefined(self, tag: u16, values: &[u8]) -> Self {
        self.raw(tag, 7, values.len() as u32, values.to_vec())
    }

    pub fn rational(self, tag: u16, numerator: u32, denominator: u32) -> Self {
        let mut payload = self.order.u32(numerator).to_vec();
        payload.extend_from_slice(&self.order.u32(denominator));
        self.raw(tag, 5, 1, payload)
    }

    /// Size of the record list including count and next link.
    pub fn directory_len(&self) -> usize {
        2 + self.entries.len() * 12 + 4
    }

    /// Encode the directory as if placed at `at`, with out-of-line values
    /// following the record list.
    pub fn encode(&self, at: u32, next: u32) -> Vec<u8> {
        let mut entries: Vec<&EntryBuilder> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.tag);

        let mut head = Vec::new();
        let mut tail = Vec::new();
        let tail_start = at as usize + self.directory_len();

        head.extend_from_slice(&self.order.u16(entries.len() as u16));
        for entry in entries {
            head.extend_from_slice(&self.order.u16(entry.tag));
            head.extend_from_slice(&self.order.u16(entry.field_type));
            head.extend_from_slice(&self.order.u32(entry.count));
            if entry.payload.len() <= 4 {
                let mut inline = entry.payload.clone();
                inline.resize(4, 0);
                head.extend_from_slice(&inline);
            } else {
                let offset = (tail_start + tail.len()) as u32;
                head.extend_from_slice(&self.order.u32(offset));
                tail.extend_from_slice(&entry.payload);
                if tail.len() % 2 == 1 {
                    tail.push(0);
                }
            }
        }
        head.extend_from_slice(&self.order.u32(next));
        head.extend(tail);
        head
    }
}

// =============================================================================
// File Builder
// =============================================================================

/// Assembles a file front to back.
pub struct FileBuilder {
    pub order: ByteOrderType,
    pub data: Vec<u8>,
}

impl FileBuilder {
    /// Header with magic 42 and a first-directory offset of 0 (set later).
    pub fn new(order: ByteOrderType) -> Self {
        Self::with_magic(order, 42)
    }

    pub fn with_magic(order: ByteOrderType, magic: u16) -> Self {
        let mut data = match order {
            ByteOrderType::LittleEndian => b"II".to_vec(),
            ByteOrderType::BigEndian => b"MM".to_vec(),
        };
        data.extend_from_slice(&order.u16(magic));
        data.extend_from_slice(&order.u32(0));
        Self { order, data }
    }

    /// Offset the next appended block will land at.
    pub fn next_offset(&mut self) -> u32 {
        if self.data.len() % 2 == 1 {
            self.data.push(0);
        }
        self.data.len() as u32
    }

    /// Append raw bytes and return their offset.
    pub fn append(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.next_offset();
        self.data.extend_from_slice(bytes);
        offset
    }

    /// Append a directory and return its offset.
    pub fn directory(&mut self, ifd: &IfdBuilder, next: u32) -> u32 {
        let offset = self.next_offset();
        let bytes = ifd.encode(offset, next);
        self.data.extend(bytes);
        offset
    }

    /// Append a directory encrypted with the SR2 cipher. Returns
    /// `(offset, length)` of the ciphertext.
    pub fn encrypted_directory(&mut self, ifd: &IfdBuilder, raw_key: u32) -> (u32, u32) {
        let offset = self.next_offset();
        let plain = ifd.encode(offset, 0);
        let ciphertext = cipher::decrypt(&plain, derive_key(raw_key));
        self.data.extend_from_slice(&ciphertext);
        (offset, ciphertext.len() as u32)
    }

    pub fn set_first_directory(&mut self, offset: u32) {
        let bytes = self.order.u32(offset);
        self.data[4..8].copy_from_slice(&bytes);
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

// =============================================================================
// Synthetic ARW
// =============================================================================

pub const RAW_KEY: u32 = 0x12345678;
pub const THUMBNAIL: &[u8] = &[0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x10, 0xFF, 0xD9];

/// What goes into a synthetic ARW.
pub struct ArwOptions {
    pub order: ByteOrderType,
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub compression: u16,
    pub raw_file_type: Option<u16>,
    pub strip: Vec<u8>,
    pub with_sr2: bool,
    /// Key written to the private directory. Encryption always uses
    /// [`RAW_KEY`], so anything else decrypts to garbage.
    pub stored_key: u32,
    /// Override the stored SR2 length.
    pub sr2_length: Option<u32>,
    /// Override the stored StripByteCounts.
    pub strip_byte_count: Option<u32>,
}

impl ArwOptions {
    /// 32x2 compressed strip built from [`compressed_strip`].
    pub fn compressed() -> Self {
        Self {
            order: ByteOrderType::LittleEndian,
            width: 32,
            height: 2,
            bits_per_sample: 12,
            compression: 32767,
            raw_file_type: Some(2),
            strip: compressed_strip(),
            with_sr2: true,
            stored_key: RAW_KEY,
            sr2_length: None,
            strip_byte_count: None,
        }
    }

    /// 4x2 uncompressed 14-bit strip holding 1000..=1007.
    pub fn uncompressed(order: ByteOrderType) -> Self {
        let strip = (0..8u16).flat_map(|i| order.u16(1000 + i)).collect();
        Self {
            order,
            width: 4,
            height: 2,
            bits_per_sample: 14,
            compression: 1,
            raw_file_type: Some(0),
            strip,
            with_sr2: false,
            stored_key: RAW_KEY,
            sr2_length: None,
            strip_byte_count: None,
        }
    }
}

/// Four blocks: (max, min) = (1000, 100), (1100, 200), (1200, 300),
/// (1300, 400), max at position 0, min at 1, every delta code 64.
pub fn compressed_strip() -> Vec<u8> {
    let mut strip = Vec::new();
    for (max, min) in [(1000, 100), (1100, 200), (1200, 300), (1300, 400)] {
        let block = RawBlock {
            max,
            min,
            max_offset: 0,
            min_offset: 1,
            deltas: [64; 14],
        };
        strip.extend_from_slice(&block.pack());
    }
    strip
}

/// Build a synthetic ARW.
///
/// Layout: strip, thumbnail, Exif, SR2, private directory, raw directory,
/// IFD1 (thumbnail), IFD0.
pub fn build_arw(options: &ArwOptions) -> Vec<u8> {
    let order = options.order;
    let mut file = FileBuilder::new(order);

    let strip_offset = file.append(&options.strip);
    let thumb_offset = file.append(THUMBNAIL);

    let exif = IfdBuilder::new(order)
        .rational(33434, 1, 250)
        .rational(33437, 28, 10)
        .short(34855, 100)
        .ascii(36867, "2024:05:01 10:00:00")
        .rational(37386, 35, 1)
        .ascii(42036, "FE 35mm F1.8");
    let exif_offset = file.directory(&exif, 0);

    let mut private = IfdBuilder::new(order);
    if options.with_sr2 {
        let sr2 = IfdBuilder::new(order)
            .shorts(0x7310, &[512, 513, 514, 515])
            .shorts(0x7303, &[1024, 2000, 1500, 1024]);
        let (sr2_offset, sr2_length) = file.encrypted_directory(&sr2, RAW_KEY);
        private = private
            .long(0x7200, sr2_offset)
            .long(0x7201, options.sr2_length.unwrap_or(sr2_length))
            .undefined(0x7221, &order.u32(options.stored_key));
    }
    let private_offset = file.directory(&private, 0);

    let mut raw = IfdBuilder::new(order)
        .long(256, options.width)
        .long(257, options.height)
        .short(258, options.bits_per_sample)
        .short(259, options.compression)
        .long(273, strip_offset)
        .long(278, options.height)
        .long(
            279,
            options
                .strip_byte_count
                .unwrap_or(options.strip.len() as u32),
        )
        .shorts(0x7010, &[8000, 10400, 12900, 14100])
        .shorts(33421, &[2, 2])
        .bytes(33422, &[0, 1, 1, 2]);
    if let Some(raw_file_type) = options.raw_file_type {
        raw = raw.short(0x7000, raw_file_type);
    }
    let raw_offset = file.directory(&raw, 0);

    let ifd1 = IfdBuilder::new(order)
        .short(259, 6)
        .long(513, thumb_offset)
        .long(514, THUMBNAIL.len() as u32);
    let ifd1_offset = file.directory(&ifd1, 0);

    let ifd0 = IfdBuilder::new(order)
        .long(256, 160)
        .long(257, 120)
        .short(259, 6)
        .ascii(271, "SONY")
        .ascii(272, "ILCE-7M3")
        .short(274, 1)
        .long(330, raw_offset)
        .long(34665, exif_offset)
        .bytes(0xC634, &order.u32(private_offset));
    let ifd0_offset = file.directory(&ifd0, ifd1_offset);

    file.set_first_directory(ifd0_offset);
    file.build()
}

/// Header plus one directory, as bytes.
pub fn single_directory_file(order: ByteOrderType, ifd: &IfdBuilder) -> Vec<u8> {
    let mut file = FileBuilder::new(order);
    let offset = file.directory(ifd, 0);
    file.set_first_directory(offset);
    file.build()
}

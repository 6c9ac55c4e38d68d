//! Tag directory parsing.
//!
//! ```text
//! u16              record count n
//! n x 12 bytes     records: u16 tag, u16 type, u32 count, u32 value-or-offset
//! u32              offset of the next directory (0 ends the chain)
//! ```
//!
//! The parser returns one flat directory. Following sub-directory tags and
//! next-directory links is left to the caller (see [`super::walk`]).

use tracing::debug;

use crate::config::DecodeLimits;
use crate::error::FormatError;
use crate::io::{ByteCursor, RangeReader};

use super::parser::ByteOrder;
use super::tags::{FieldType, TiffTag};
use super::values::DecodedValue;

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = 12;

/// Field type code used by some writers for sub-directory offsets.
const FIELD_TYPE_IFD: u16 = 13;

// =============================================================================
// TagRecord
// =============================================================================

/// One 12-byte directory record, before its value is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRecord {
    pub tag: u16,

    /// Field type as stored, kept even when it is not a known type.
    pub field_type_raw: u16,

    pub field_type: Option<FieldType>,

    pub count: u32,

    /// The value field read as a u32 in the file's byte order.
    pub value_offset: u32,

    /// The value field exactly as stored.
    pub raw_value: [u8; 4],
}

impl TagRecord {
    /// Parse a record from its 12 bytes.
    pub fn parse(bytes: &[u8], byte_order: ByteOrder) -> Self {
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);
        let raw_value = [bytes[8], bytes[9], bytes[10], bytes[11]];
        Self {
            tag: byte_order.read_u16(&bytes[0..2]),
            field_type_raw,
            field_type: FieldType::from_u16(field_type_raw),
            count: byte_order.read_u32(&bytes[4..8]),
            value_offset: byte_order.read_u32(&raw_value),
            raw_value,
        }
    }

    /// Serialize the record back into its 12 bytes.
    pub fn encode(&self, byte_order: ByteOrder) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[0..2].copy_from_slice(&byte_order.u16_bytes(self.tag));
        out[2..4].copy_from_slice(&byte_order.u16_bytes(self.field_type_raw));
        out[4..8].copy_from_slice(&byte_order.u32_bytes(self.count));
        out[8..12].copy_from_slice(&self.raw_value);
        out
    }

    /// Total size of the value in bytes, `None` for unknown types.
    pub fn value_byte_len(&self) -> Option<u64> {
        self.field_type.and_then(|t| t.total_len(self.count))
    }

    /// Whether the value is packed into the record itself.
    pub fn is_inline(&self) -> bool {
        self.field_type.is_some_and(|t| t.fits_inline(self.count))
    }

    /// Name of the tag if it is a known standard tag.
    pub fn tag_name(&self) -> Option<TiffTag> {
        TiffTag::from_u16(self.tag)
    }
}

// =============================================================================
// Directory
// =============================================================================

/// A record together with its resolved value.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    pub record: TagRecord,
    pub value: DecodedValue,
}

/// A parsed directory: its records in file order plus the chain link.
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    /// Absolute offset the directory was read from.
    pub offset: u32,

    /// Byte order the directory was decoded with.
    pub byte_order: ByteOrder,

    pub entries: Vec<DirectoryEntry>,

    /// Offset of the next directory in the chain, 0 at the end.
    pub next_directory_offset: u32,
}

impl Directory {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry with the given tag.
    pub fn entry(&self, tag: u16) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.record.tag == tag)
    }

    pub fn value(&self, tag: u16) -> Option<&DecodedValue> {
        self.entry(tag).map(|e| &e.value)
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.entry(tag).is_some()
    }

    /// First element of an integer value.
    pub fn u32_value(&self, tag: u16) -> Option<u32> {
        self.value(tag).and_then(DecodedValue::as_u32)
    }

    pub fn string_value(&self, tag: u16) -> Option<String> {
        self.value(tag).and_then(DecodedValue::as_str)
    }

    /// Interpret a tag as one or more directory offsets.
    ///
    /// Accepts LONG and SHORT arrays, the IFD field type, and a 4-byte
    /// BYTE/UNDEFINED blob holding a single offset in file byte order.
    pub fn offsets_value(&self, tag: u16) -> Vec<u32> {
        let Some(entry) = self.entry(tag) else {
            return Vec::new();
        };
        match &entry.value {
            DecodedValue::Bytes(b) | DecodedValue::Undefined(b) if b.len() == 4 => {
                vec![self.byte_order.read_u32(b)]
            }
            DecodedValue::Unknown {
                field_type: FIELD_TYPE_IFD,
                count: 1,
                raw,
            } => vec![self.byte_order.read_u32(raw)],
            value => value.to_u32_vec().unwrap_or_default(),
        }
    }

    /// Iterate over entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &DirectoryEntry> {
        self.entries.iter()
    }

    /// One `UnknownFieldType` per record whose field type is not recognised.
    ///
    /// The IFD field type is not reported: it only ever carries an offset and
    /// [`Self::offsets_value`] understands it.
    pub fn unknown_field_types(&self) -> impl Iterator<Item = FormatError> + '_ {
        self.entries
            .iter()
            .filter(|e| e.record.field_type.is_none() && e.record.field_type_raw != FIELD_TYPE_IFD)
            .map(|e| FormatError::UnknownFieldType {
                tag: e.record.tag,
                field_type: e.record.field_type_raw,
            })
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse the directory at `offset`.
///
/// Record values are resolved by the placement rule: inline values come from
/// the record itself, larger ones are read from their offset without moving
/// the cursor off the record list. A record with an unknown field type becomes
/// [`DecodedValue::Unknown`] and parsing continues.
///
/// # Errors
/// - `TruncatedRead` if the records or an out-of-line value run past the end
/// - `UnreasonableLength` if the record list or a value exceeds
///   `limits.max_allocation`
pub fn parse_directory<R: RangeReader + ?Sized>(
    cursor: &mut ByteCursor<'_, R>,
    offset: u32,
    limits: &DecodeLimits,
) -> Result<Directory, FormatError> {
    let byte_order = cursor.byte_order();
    cursor.seek(offset as u64);

    let record_count = cursor.read_u16()?;
    let records_len = record_count as usize * RECORD_SIZE;
    limits.check_allocation("directory records", records_len as u64)?;

    let records = cursor.read_bytes(records_len)?;
    let next_directory_offset = cursor.read_u32()?;

    let mut entries = Vec::with_capacity(record_count as usize);
    let mut value_bytes_total: u64 = 0;

    for chunk in records.chunks_exact(RECORD_SIZE) {
        let record = TagRecord::parse(chunk, byte_order);

        let value = match record.field_type {
            None => {
                debug!(
                    tag = record.tag,
                    field_type = record.field_type_raw,
                    "Unknown field type, keeping raw value"
                );
                DecodedValue::Unknown {
                    field_type: record.field_type_raw,
                    count: record.count,
                    raw: record.raw_value,
                }
            }
            Some(field_type) if field_type.fits_inline(record.count) => {
                DecodedValue::decode(field_type, record.count, &record.raw_value, byte_order)
            }
            Some(field_type) => {
                let len = field_type.total_len(record.count).unwrap_or(u64::MAX);
                limits.check_allocation("tag value", len)?;
                value_bytes_total = value_bytes_total.saturating_add(len);
                limits.check_allocation("directory values", value_bytes_total)?;

                let bytes = cursor.read_at(record.value_offset as u64, len as usize)?;
                DecodedValue::decode(field_type, record.count, &bytes, byte_order)
            }
        };

        entries.push(DirectoryEntry { record, value });
    }

    debug!(
        offset,
        records = record_count,
        next = next_directory_offset,
        "Parsed directory"
    );

    Ok(Directory {
        offset,
        byte_order,
        entries,
        next_directory_offset,
    })
}

// =============================================================================
// Tests
// =============================================================================

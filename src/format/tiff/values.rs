//! Typed value model.
//!
//! A record's value is either packed into its 4-byte value field or stored
//! at an offset elsewhere in the file, depending only on
//! `byte_width(type) * count` (see [`FieldType::fits_inline`]). This module
//! turns the resolved bytes into a [`DecodedValue`] and back; fetching the
//! bytes is the directory parser's job.
//!
//! Rationals are kept as unreduced `(numerator, denominator)` pairs. No
//! division happens here.

use std::fmt;

use super::parser::ByteOrder;
use super::tags::FieldType;

/// Maximum number of elements rendered by the `Display` impl.
const DISPLAY_LIMIT: usize = 16;

// =============================================================================
// DecodedValue
// =============================================================================

/// A record value decoded according to its field type.
///
/// ASCII values keep their raw bytes, including the trailing NUL, so that
/// the decoded length always equals `byte_width * count`. Use
/// [`DecodedValue::as_str`] for the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Bytes(Vec<u8>),
    Ascii(Vec<u8>),
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    Rationals(Vec<(u32, u32)>),
    Undefined(Vec<u8>),
    SShorts(Vec<i16>),
    SLongs(Vec<i32>),
    SRationals(Vec<(i32, i32)>),

    /// Record with a field type this parser does not know.
    ///
    /// The byte width is unknown, so the value field is kept verbatim and
    /// never dereferenced.
    Unknown {
        field_type: u16,
        count: u32,
        raw: [u8; 4],
    },
}

impl DecodedValue {
    /// Decode `count` elements of `field_type` from `bytes`.
    ///
    /// `bytes` should hold `field_type.total_len(count)` bytes; any excess is
    /// ignored and a short slice yields fewer elements.
    pub fn decode(field_type: FieldType, count: u32, bytes: &[u8], byte_order: ByteOrder) -> Self {
        let len = field_type.byte_width() * count as usize;
        let bytes = bytes.get(..len).unwrap_or(bytes);

        match field_type {
            FieldType::Byte => DecodedValue::Bytes(bytes.to_vec()),
            FieldType::Ascii => DecodedValue::Ascii(bytes.to_vec()),
            FieldType::Undefined => DecodedValue::Undefined(bytes.to_vec()),
            FieldType::Short => DecodedValue::Shorts(
                bytes
                    .chunks_exact(2)
                    .map(|c| byte_order.read_u16(c))
                    .collect(),
            ),
            FieldType::SShort => DecodedValue::SShorts(
                bytes
                    .chunks_exact(2)
                    .map(|c| byte_order.read_u16(c) as i16)
                    .collect(),
            ),
            FieldType::Long => DecodedValue::Longs(
                bytes
                    .chunks_exact(4)
                    .map(|c| byte_order.read_u32(c))
                    .collect(),
            ),
            FieldType::SLong => DecodedValue::SLongs(
                bytes
                    .chunks_exact(4)
                    .map(|c| byte_order.read_u32(c) as i32)
                    .collect(),
            ),
            FieldType::Rational => DecodedValue::Rationals(
                bytes
                    .chunks_exact(8)
                    .map(|c| (byte_order.read_u32(&c[..4]), byte_order.read_u32(&c[4..])))
                    .collect(),
            ),
            FieldType::SRational => DecodedValue::SRationals(
                bytes
                    .chunks_exact(8)
                    .map(|c| {
                        (
                            byte_order.read_u32(&c[..4]) as i32,
                            byte_order.read_u32(&c[4..]) as i32,
                        )
                    })
                    .collect(),
            ),
        }
    }

    /// Decode a value packed left-justified into a record's value field.
    ///
    /// Returns `None` when the value does not fit inline.
    pub fn decode_inline(
        field_type: FieldType,
        count: u32,
        raw: [u8; 4],
        byte_order: ByteOrder,
    ) -> Option<Self> {
        if !field_type.fits_inline(count) {
            return None;
        }
        Some(Self::decode(field_type, count, &raw, byte_order))
    }

    /// The field type this value was decoded as, `None` for `Unknown`.
    pub fn field_type(&self) -> Option<FieldType> {
        Some(match self {
            DecodedValue::Bytes(_) => FieldType::Byte,
            DecodedValue::Ascii(_) => FieldType::Ascii,
            DecodedValue::Shorts(_) => FieldType::Short,
            DecodedValue::Longs(_) => FieldType::Long,
            DecodedValue::Rationals(_) => FieldType::Rational,
            DecodedValue::Undefined(_) => FieldType::Undefined,
            DecodedValue::SShorts(_) => FieldType::SShort,
            DecodedValue::SLongs(_) => FieldType::SLong,
            DecodedValue::SRationals(_) => FieldType::SRational,
            DecodedValue::Unknown { .. } => return None,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            DecodedValue::Bytes(v) | DecodedValue::Ascii(v) | DecodedValue::Undefined(v) => {
                v.len()
            }
            DecodedValue::Shorts(v) => v.len(),
            DecodedValue::Longs(v) => v.len(),
            DecodedValue::Rationals(v) => v.len(),
            DecodedValue::SShorts(v) => v.len(),
            DecodedValue::SLongs(v) => v.len(),
            DecodedValue::SRationals(v) => v.len(),
            DecodedValue::Unknown { count, .. } => *count as usize,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encoded size in bytes, `None` for `Unknown`.
    pub fn byte_len(&self) -> Option<usize> {
        self.field_type().map(|t| t.byte_width() * self.len())
    }

    /// Encode the value back into file bytes.
    ///
    /// `Unknown` values yield their verbatim 4-byte field.
    pub fn encode(&self, byte_order: ByteOrder) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len().unwrap_or(4));
        match self {
            DecodedValue::Bytes(v) | DecodedValue::Ascii(v) | DecodedValue::Undefined(v) => {
                out.extend_from_slice(v)
            }
            DecodedValue::Shorts(v) => v
                .iter()
                .for_each(|x| out.extend_from_slice(&byte_order.u16_bytes(*x))),
            DecodedValue::SShorts(v) => v
                .iter()
                .for_each(|x| out.extend_from_slice(&byte_order.u16_bytes(*x as u16))),
            DecodedValue::Longs(v) => v
                .iter()
                .for_each(|x| out.extend_from_slice(&byte_order.u32_bytes(*x))),
            DecodedValue::SLongs(v) => v
                .iter()
                .for_each(|x| out.extend_from_slice(&byte_order.u32_bytes(*x as u32))),
            DecodedValue::Rationals(v) => v.iter().for_each(|(n, d)| {
                out.extend_from_slice(&byte_order.u32_bytes(*n));
                out.extend_from_slice(&byte_order.u32_bytes(*d));
            }),
            DecodedValue::SRationals(v) => v.iter().for_each(|(n, d)| {
                out.extend_from_slice(&byte_order.u32_bytes(*n as u32));
                out.extend_from_slice(&byte_order.u32_bytes(*d as u32));
            }),
            DecodedValue::Unknown { raw, .. } => out.extend_from_slice(raw),
        }
        out
    }

    /// Encode into a 4-byte value field, left-justified and zero padded.
    ///
    /// Returns `None` if the value does not fit inline.
    pub fn encode_inline(&self, byte_order: ByteOrder) -> Option<[u8; 4]> {
        let bytes = self.encode(byte_order);
        if bytes.len() > FieldType::INLINE_THRESHOLD {
            return None;
        }
        let mut field = [0u8; 4];
        field[..bytes.len()].copy_from_slice(&bytes);
        Some(field)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// First element as an unsigned integer (BYTE, SHORT or LONG).
    pub fn as_u32(&self) -> Option<u32> {
        self.u32_at(0)
    }

    /// Element `index` as an unsigned integer (BYTE, SHORT or LONG).
    pub fn u32_at(&self, index: usize) -> Option<u32> {
        match self {
            DecodedValue::Bytes(v) => v.get(index).map(|&x| x as u32),
            DecodedValue::Shorts(v) => v.get(index).map(|&x| x as u32),
            DecodedValue::Longs(v) => v.get(index).copied(),
            _ => None,
        }
    }

    /// All elements as unsigned integers (BYTE, SHORT or LONG).
    pub fn to_u32_vec(&self) -> Option<Vec<u32>> {
        match self {
            DecodedValue::Bytes(v) => Some(v.iter().map(|&x| x as u32).collect()),
            DecodedValue::Shorts(v) => Some(v.iter().map(|&x| x as u32).collect()),
            DecodedValue::Longs(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// All elements as signed integers (any integer type).
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            DecodedValue::SShorts(v) => Some(v.iter().map(|&x| x as i64).collect()),
            DecodedValue::SLongs(v) => Some(v.iter().map(|&x| x as i64).collect()),
            other => other
                .to_u32_vec()
                .map(|v| v.into_iter().map(i64::from).collect()),
        }
    }

    /// First rational, as `(numerator, denominator)`.
    pub fn as_rational(&self) -> Option<(u32, u32)> {
        match self {
            DecodedValue::Rationals(v) => v.first().copied(),
            _ => None,
        }
    }

    /// Text of an ASCII value, cut at the first NUL and trimmed.
    pub fn as_str(&self) -> Option<String> {
        match self {
            DecodedValue::Ascii(v) => {
                let end = v.iter().position(|&b| b == 0).unwrap_or(v.len());
                Some(String::from_utf8_lossy(&v[..end]).trim().to_string())
            }
            _ => None,
        }
    }

    /// Raw bytes of a BYTE, UNDEFINED or ASCII value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DecodedValue::Bytes(v) | DecodedValue::Undefined(v) | DecodedValue::Ascii(v) => {
                Some(v)
            }
            _ => None,
        }
    }
}

// =============================================================================
// Display
// =============================================================================

fn write_list<T, F>(f: &mut fmt::Formatter<'_>, items: &[T], mut each: F) -> fmt::Result
where
    F: FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
{
    write!(f, "[")?;
    for (i, item) in items.iter().take(DISPLAY_LIMIT).enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        each(f, item)?;
    }
    if items.len() > DISPLAY_LIMIT {
        write!(f, ", ... +{} more", items.len() - DISPLAY_LIMIT)?;
    }
    write!(f, "]")
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Ascii(_) => write!(f, "{:?}", self.as_str().unwrap_or_default()),
            DecodedValue::Bytes(v) | DecodedValue::Undefined(v) => {
                let shown = &v[..v.len().min(DISPLAY_LIMIT * 2)];
                write!(f, "0x{}", hex::encode(shown))?;
                if v.len() > shown.len() {
                    write!(f, "... ({} bytes)", v.len())?;
                }
                Ok(())
            }
            DecodedValue::Shorts(v) => write_list(f, v, |f, x| write!(f, "{}", x)),
            DecodedValue::Longs(v) => write_list(f, v, |f, x| write!(f, "{}", x)),
            DecodedValue::SShorts(v) => write_list(f, v, |f, x| write!(f, "{}", x)),
            DecodedValue::SLongs(v) => write_list(f, v, |f, x| write!(f, "{}", x)),
            DecodedValue::Rationals(v) => write_list(f, v, |f, (n, d)| write!(f, "{}/{}", n, d)),
            DecodedValue::SRationals(v) => write_list(f, v, |f, (n, d)| write!(f, "{}/{}", n, d)),
            DecodedValue::Unknown {
                field_type,
                count,
                raw,
            } => write!(
                f,
                "<unknown type {} x{}: 0x{}>",
                field_type,
                count,
                hex::encode(raw)
            ),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

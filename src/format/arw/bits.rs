//! Bit cursor over one 128-bit codec block.
//!
//! The block is read most-significant-bit first as two big-endian 64-bit
//! words. Fields are not byte or word aligned; a field may start in the high
//! word and end in the low word.

/// Bits in one block.
pub const BLOCK_BITS: u32 = 128;

/// Bytes in one block.
pub const BLOCK_BYTES: usize = 16;

const WORD_BITS: u32 = 64;

// =============================================================================
// BlockBits
// =============================================================================

/// Reads fields of up to 32 bits from a 128-bit block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockBits {
    words: [u64; 2],
    position: u32,
}

impl BlockBits {
    pub fn new(block: &[u8; BLOCK_BYTES]) -> Self {
        let mut high = [0u8; 8];
        let mut low = [0u8; 8];
        high.copy_from_slice(&block[..8]);
        low.copy_from_slice(&block[8..]);
        Self {
            words: [u64::from_be_bytes(high), u64::from_be_bytes(low)],
            position: 0,
        }
    }

    /// Bit index of the next field, 0 to 127.
    #[inline]
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Move to an absolute bit index (taken modulo 128).
    #[inline]
    pub fn seek(&mut self, position: u32) {
        self.position = position % BLOCK_BITS;
    }

    /// Read the next `width` bits, `1 <= width <= 32`.
    ///
    /// The cursor wraps at the end of the block, so a field crossing bit 127
    /// continues from bit 0.
    pub fn take(&mut self, width: u32) -> u32 {
        debug_assert!((1..=32).contains(&width));

        let index = (self.position / WORD_BITS) as usize;
        let within = self.position % WORD_BITS;
        let available = WORD_BITS - within;
        let current = self.words[index];

        let value = if width <= available {
            (current << within) >> (WORD_BITS - width)
        } else {
            // High part from the end of this word, low part from the start
            // of the next one
            let low_width = width - available;
            let high = (current << within) >> within;
            let next = self.words[(index + 1) % 2];
            (high << low_width) | (next >> (WORD_BITS - low_width))
        };

        self.position = (self.position + width) % BLOCK_BITS;
        value as u32
    }
}

// =============================================================================
// BlockWriter
// =============================================================================

/// Packs fields into a 128-bit block, most significant bit first.
///
/// Used to build blocks for encoding and for tests; writes one bit at a
/// time and shares no code with [`BlockBits`].
#[derive(Debug, Clone, Default)]
pub struct BlockWriter {
    bytes: [u8; BLOCK_BYTES],
    position: u32,
}

impl BlockWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(position: u32) -> Self {
        Self {
            bytes: [0; BLOCK_BYTES],
            position: position % BLOCK_BITS,
        }
    }

    /// Append the low `width` bits of `value`.
    pub fn put(&mut self, value: u32, width: u32) -> &mut Self {
        for shift in (0..width).rev() {
            let bit = ((value >> shift) & 1) as u8;
            let byte = (self.position / 8) as usize;
            let mask = 0x80u8 >> (self.position % 8);
            if bit == 1 {
                self.bytes[byte] |= mask;
            } else {
                self.bytes[byte] &= !mask;
            }
            self.position = (self.position + 1) % BLOCK_BITS;
        }
        self
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn finish(&self) -> [u8; BLOCK_BYTES] {
        self.bytes
    }
}

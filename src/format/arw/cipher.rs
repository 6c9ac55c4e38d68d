//! SR2 stream cipher.
//!
//! Some firmware stores the SR2 directory XOR-masked by a keystream taken
//! from a 128-word self-updating pad table. The transform is its own inverse
//! and carries no authentication; the caller checks the decrypted region by
//! parsing it as a directory.

/// Multiplier of the key schedule recurrence `key = key * 0x0EDD + 1`.
const KEY_MULTIPLIER: u32 = 0x0EDD;

const PAD_WORDS: usize = 128;

/// Offset, length and raw key of an SR2 region, as read from the private
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherKeyMaterial {
    pub offset: u32,
    pub length: u32,
    pub raw_key: u32,
}

impl CipherKeyMaterial {
    /// Key actually fed to the pad setup.
    pub fn derived_key(&self) -> u32 {
        derive_key(self.raw_key)
    }

    /// Absolute end of the region, `None` if it overflows.
    pub fn end(&self) -> Option<u64> {
        (self.offset as u64).checked_add(self.length as u64)
    }
}

/// `raw * 0x0EDD + 1`, modulo 2^32.
#[inline]
pub fn derive_key(raw: u32) -> u32 {
    raw.wrapping_mul(KEY_MULTIPLIER).wrapping_add(1)
}

/// Cipher state: the pad table plus the running index.
struct Keystream {
    pad: [u32; PAD_WORDS],
    index: usize,
}

impl Keystream {
    fn new(mut key: u32) -> Self {
        let mut pad = [0u32; PAD_WORDS];
        for slot in pad.iter_mut().take(4) {
            key = derive_key(key);
            *slot = key;
        }
        pad[3] = (pad[3] << 1) | ((pad[0] ^ pad[2]) >> 31);
        for i in 4..PAD_WORDS - 1 {
            pad[i] = ((pad[i - 4] ^ pad[i - 2]) << 1) | ((pad[i - 3] ^ pad[i - 1]) >> 31);
        }
        Self {
            pad,
            index: PAD_WORDS - 1,
        }
    }

    /// Next keystream word. The word is written back into the table before
    /// it is returned; later words depend on it.
    #[inline]
    fn next_word(&mut self) -> u32 {
        let i = self.index;
        let word = self.pad[(i + 1) % PAD_WORDS] ^ self.pad[(i + 65) % PAD_WORDS];
        self.pad[i % PAD_WORDS] = word;
        self.index = i + 1;
        word
    }
}

/// XOR the keystream for `derived_key` over `buf`, in place.
///
/// One keystream word is consumed per byte; its low 8 bits are used.
pub fn apply_in_place(buf: &mut [u8], derived_key: u32) {
    let mut stream = Keystream::new(derived_key);
    for byte in buf.iter_mut() {
        *byte ^= stream.next_word() as u8;
    }
}

/// Decrypt (or encrypt) `ciphertext` with `derived_key`.
pub fn decrypt(ciphertext: &[u8], derived_key: u32) -> Vec<u8> {
    let mut out = ciphertext.to_vec();
    apply_in_place(&mut out, derived_key);
    out
}

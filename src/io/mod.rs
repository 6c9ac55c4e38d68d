//! Byte sources and the positioned cursor used by every parser.

mod block_cache;
mod cursor;
mod file_reader;
mod range_reader;

pub use block_cache::{BlockCache, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY};
pub use cursor::ByteCursor;
pub use file_reader::FileReader;
pub use range_reader::{
    read_u16_be, read_u16_le, read_u32_be, read_u32_le, MemoryReader, RangeReader,
    RelocatedReader,
};

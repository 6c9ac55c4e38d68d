use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use bytes::Bytes;

use super::range_reader::check_range;
use super::RangeReader;
use crate::error::IoError;

/// Range reader over a local file.
///
/// The handle sits behind a mutex because a seek followed by a read must not
/// interleave with another caller's seek.
pub struct FileReader {
    file: Mutex<File>,
    size: u64,
    identifier: String,
}

impl FileReader {
    /// Open a file for random-access reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(Self {
            file: Mutex::new(file),
            size,
            identifier: format!("file://{}", path.display()),
        })
    }
}

impl RangeReader for FileReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size)?;

        let mut file = self
            .file
            .lock()
            .map_err(|_| IoError::Read("file handle lock poisoned".to_string()))?;

        let mut buf = vec![0u8; len];
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use common::{Error, Result};

/// Byte-range read capability over an immutable file.
///
/// Reads may run concurrently from multiple threads; implementations
/// must not depend on a shared cursor position across calls.
pub trait RandomAccessFile: Send + Sync {
    /// Reads exactly `len` bytes starting at `offset`. A short file is an
    /// error, not a truncated result.
    fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>>;
}

/// [`RandomAccessFile`] over an ordinary filesystem file. A persistent
/// handle is kept open for the reader's lifetime, wrapped in a `Mutex` so
/// reads can go through a shared reference.
pub struct FsRandomAccessFile {
    file: Mutex<File>,
}

impl FsRandomAccessFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<FsRandomAccessFile> {
        let file = File::open(path)?;
        Ok(FsRandomAccessFile {
            file: Mutex::new(file),
        })
    }

    /// Current file size in bytes.
    pub fn len(&self) -> Result<u64> {
        let file = self.lock()?;
        Ok(file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|e| Error::Io(format!("file lock poisoned: {e}")))
    }
}

impl RandomAccessFile for FsRandomAccessFile {
    fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// In-memory [`RandomAccessFile`], mostly for tests and for tables built
/// and consumed inside one process.
pub struct MemFile {
    data: Vec<u8>,
}

impl MemFile {
    #[must_use]
    pub fn new(data: Vec<u8>) -> MemFile {
        MemFile { data }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl RandomAccessFile for MemFile {
    fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let start = offset as usize;
        let end = start.checked_add(len);
        match end {
            Some(end) if end <= self.data.len() => Ok(self.data[start..end].to_vec()),
            _ => Err(Error::Io(format!(
                "read past end of file: offset {offset} len {len} size {}",
                self.data.len()
            ))),
        }
    }
}

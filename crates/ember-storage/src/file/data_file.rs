//! The backing data file.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

use super::error::{FileError, FileResult};

/// A handle to the backing file with positional read/write access.
///
/// All operations address the file by absolute byte offset; the descriptor
/// carries no cursor state, so a single `DataFile` may be shared freely
/// across threads. Transient interruptions (`EINTR`) are retried
/// internally and never surface to callers.
#[derive(Debug)]
pub struct DataFile {
    file: File,
    path: PathBuf,
}

impl DataFile {
    /// Opens the file read-write, creating it if absent.
    pub fn open(path: impl AsRef<Path>) -> FileResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| FileError::open(&path, e))?;
        Ok(Self { file, path })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current file size in bytes.
    pub fn size(&self) -> FileResult<u64> {
        Ok(self.file.metadata().map(|m| m.len())?)
    }

    /// Clones the handle, duplicating the underlying descriptor.
    pub fn try_clone(&self) -> FileResult<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
        })
    }

    /// Reads exactly `buf.len()` bytes starting at `offset`.
    ///
    /// A short read at end-of-file zero-fills the remainder of `buf` and
    /// counts as success: pages past EOF read as zeroes and come into
    /// existence on first write.
    pub fn read_full_at(&self, buf: &mut [u8], offset: u64) -> FileResult<()> {
        let mut total = 0usize;
        while total < buf.len() {
            match self.file.read_at(&mut buf[total..], offset + total as u64) {
                Ok(0) => {
                    // EOF: the rest of the page does not exist yet.
                    buf[total..].fill(0);
                    return Ok(());
                }
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Writes all of `buf` starting at `offset`, retrying transient
    /// interruptions until complete or a permanent error.
    pub fn write_all_at(&self, buf: &[u8], offset: u64) -> FileResult<()> {
        let mut total = 0usize;
        while total < buf.len() {
            match self.file.write_at(&buf[total..], offset + total as u64) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "positional write returned zero bytes",
                    )
                    .into());
                }
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Flushes file data and metadata to disk.
    pub fn sync(&self) -> FileResult<()> {
        Ok(self.file.sync_all()?)
    }
}

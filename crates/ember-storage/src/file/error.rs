//! I/O error types for the file module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

/// Errors that can occur during backing-file I/O.
#[derive(Debug, Error)]
pub enum FileError {
    /// The backing file could not be opened. Fatal at construction.
    #[error("cannot open backing file {path}: {source}")]
    Open {
        /// Path of the file that failed to open.
        path: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// A positional read or write failed with a non-transient error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying OS error.
        #[from]
        source: io::Error,
    },
}

impl FileError {
    /// Creates an open error with path context.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error was fatal at construction time.
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_carries_path() {
        let err = FileError::open(
            "/no/such/file",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.is_open_failure());
        assert!(err.to_string().contains("/no/such/file"));
    }

    #[test]
    fn test_io_error_from_std() {
        let err: FileError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert!(!err.is_open_failure());
    }
}

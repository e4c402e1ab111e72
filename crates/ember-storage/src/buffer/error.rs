//! Buffer pool errors.

use thiserror::Error;

use crate::file::FileError;

/// Result type for buffer pool operations.
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer pool operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Eviction found no unpinned victim. The requesting operation fails;
    /// it can be retried once a frame is unpinned.
    #[error("all resident pages are pinned, cannot evict")]
    AllPinned,

    /// Invalid pool configuration. Fatal at construction.
    #[error("configuration error: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },

    /// A backing-file read or write failed.
    #[error(transparent)]
    File(#[from] FileError),
}

impl BufferError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the condition may clear on retry.
    ///
    /// `AllPinned` is the only expected transient in the hot path: it
    /// clears as soon as any holder drops a pin.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllPinned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_pinned_is_retryable() {
        assert!(BufferError::AllPinned.is_retryable());
        assert!(!BufferError::config("bad").is_retryable());
    }

    #[test]
    fn test_file_error_converts() {
        let err: BufferError = FileError::open(
            "/x",
            std::io::Error::new(std::io::ErrorKind::NotFound, "nope"),
        )
        .into();
        assert!(!err.is_retryable());
    }
}

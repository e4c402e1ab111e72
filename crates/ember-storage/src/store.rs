//! The page store seam.
//!
//! Both pool implementations - the LRU cache and the uncached direct pool
//! - expose the same page-level surface. The server holds the trait
//! object and never knows which pool is behind it.

use ember_common::config::ConfigError;
use ember_common::types::PageId;
use thiserror::Error;

use crate::buffer::BufferError;
use crate::file::FileError;

/// Result type for page store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced at the page store boundary.
///
/// The wire protocol carries no error code, so the server logs these and
/// keeps the response framing intact; the client at worst observes a
/// stale or zeroed payload.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The page number maps to no configured range.
    #[error("page {page} is out of range for this layout")]
    OutOfRange {
        /// The offending page number.
        page: PageId,
    },

    /// Invalid page layout. Fatal at construction.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A buffer pool failure (eviction or write-back).
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// A backing-file failure outside the buffer pool.
    #[error(transparent)]
    File(#[from] FileError),
}

/// Hit/miss counters for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitRate {
    /// Operations served from a resident frame.
    pub hits: u64,
    /// Operations that had to load from disk.
    pub misses: u64,
}

impl HitRate {
    /// Total counted operations.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate as a percentage, 0.0 when nothing was counted.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            100.0 * self.hits as f64 / self.total() as f64
        }
    }
}

/// Page-level read/write surface shared by the pools.
///
/// `worker` identifies the calling connection thread; pools that maintain
/// a descriptor set use it to pick a descriptor, others ignore it.
pub trait PageStore: Send + Sync {
    /// Reads page `no`, copying `page_size` bytes into `buf`.
    fn read_page(
        &self,
        no: PageId,
        page_size: usize,
        buf: &mut [u8],
        worker: usize,
    ) -> StoreResult<()>;

    /// Overwrites page `no` with `page_size` bytes from `buf`.
    fn write_page(
        &self,
        no: PageId,
        page_size: usize,
        buf: &[u8],
        worker: usize,
    ) -> StoreResult<()>;

    /// Returns hit/miss counters, if this store tracks them.
    fn hit_rate(&self) -> Option<HitRate> {
        None
    }

    /// Persists any buffered state. Called at shutdown.
    fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_percent() {
        let rate = HitRate::default();
        assert_eq!(rate.percent(), 0.0);

        let rate = HitRate {
            hits: 80,
            misses: 20,
        };
        assert_eq!(rate.total(), 100);
        assert!((rate.percent() - 80.0).abs() < f64::EPSILON);
    }
}

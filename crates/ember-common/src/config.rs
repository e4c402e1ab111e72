//! Page layout configuration.
//!
//! A deployment is described by an ordered map from page size to page
//! count. Page numbers are assigned contiguously in ascending size order:
//! a layout of `{8k: 1024, 16k: 2048}` numbers the 8 KB pages `0..1024`
//! and the 16 KB pages `1024..3072`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::MAX_POOL_BYTES;
use crate::types::PageId;

/// Errors produced when validating a page layout.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The layout contains no page ranges.
    #[error("page layout is empty")]
    Empty,

    /// A range has a zero page size.
    #[error("page size must be non-zero")]
    ZeroPageSize,

    /// A range has a zero page count.
    #[error("page count for size {size} must be non-zero")]
    ZeroPageCount {
        /// The page size of the offending range.
        size: usize,
    },

    /// The resident set implied by the first range exceeds the pool cap.
    #[error("pool of {bytes} bytes exceeds the {cap} byte cap")]
    CapExceeded {
        /// Bytes the layout would pin in memory.
        bytes: u64,
        /// The configured cap.
        cap: u64,
    },
}

/// An ordered map from page size (bytes) to page count.
///
/// For a single-size deployment the first (and only) range determines both
/// the uniform page size and the cache capacity. Multi-size deployments
/// partition page numbers by size in ascending-size order.
///
/// # Example
///
/// ```rust
/// use ember_common::config::PageLayout;
///
/// let layout = PageLayout::from_ranges([(8192, 1024), (16384, 2048)]);
/// assert_eq!(layout.total_pages(), 3072);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayout {
    ranges: BTreeMap<usize, usize>,
}

impl PageLayout {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a layout from `(page_size, page_count)` pairs.
    ///
    /// Pairs with a zero count are skipped; they contribute no pages.
    #[must_use]
    pub fn from_ranges(ranges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut layout = Self::new();
        for (size, count) in ranges {
            layout.add_range(size, count);
        }
        layout
    }

    /// Adds a range of `count` pages of `size` bytes each.
    ///
    /// A zero count is ignored. Adding the same size twice replaces the
    /// earlier count.
    pub fn add_range(&mut self, size: usize, count: usize) {
        if count > 0 {
            self.ranges.insert(size, count);
        }
    }

    /// Returns true if the layout has no ranges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the number of ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns the first range as `(page_size, page_count)`.
    ///
    /// The first range fixes the uniform page size and the capacity of the
    /// LRU pool.
    #[must_use]
    pub fn first_range(&self) -> Option<(usize, usize)> {
        self.ranges.iter().next().map(|(&s, &c)| (s, c))
    }

    /// Returns the total number of pages across all ranges.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.ranges.values().sum()
    }

    /// Returns the total on-disk size of the layout in bytes.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.ranges
            .iter()
            .map(|(&s, &c)| s as u64 * c as u64)
            .sum()
    }

    /// Iterates the ranges in ascending size order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ranges.iter().map(|(&s, &c)| (s, c))
    }

    /// Computes the byte offset of a page in the backing file.
    ///
    /// Ranges are laid out contiguously in ascending size order; the scan
    /// consumes counts until the page number falls within a range. Returns
    /// `None` when the page number maps to no range.
    #[must_use]
    pub fn page_offset(&self, no: PageId) -> Option<u64> {
        let mut boundary = 0u64;
        let mut n = no.as_u32() as u64;
        for (size, count) in self.iter() {
            let count = count as u64;
            if n >= count {
                boundary += size as u64 * count;
                n -= count;
            } else {
                return Some(boundary + n * size as u64);
            }
        }
        None
    }

    /// Validates the layout.
    ///
    /// The layout must be non-empty, every range must have a non-zero size
    /// and count, and the resident set implied by the first range must fit
    /// under [`MAX_POOL_BYTES`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranges.is_empty() {
            return Err(ConfigError::Empty);
        }
        for (size, count) in self.iter() {
            if size == 0 {
                return Err(ConfigError::ZeroPageSize);
            }
            if count == 0 {
                return Err(ConfigError::ZeroPageCount { size });
            }
        }
        let (size, count) = self.first_range().expect("non-empty layout");
        let bytes = size as u64 * count as u64;
        if bytes > MAX_POOL_BYTES {
            return Err(ConfigError::CapExceeded {
                bytes,
                cap: MAX_POOL_BYTES,
            });
        }
        Ok(())
    }
}

//! Core identifier types for EmberDB.
//!
//! Newtypes keep page numbers and log sequence numbers from being mixed
//! up with each other or with plain integers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Page identifier - the logical index of a page in the backing file.
///
/// Page numbers are stable for the life of the backing file; the wire
/// protocol carries them as 32-bit unsigned integers.
///
/// # Example
///
/// ```rust
/// use ember_common::types::PageId;
///
/// let page = PageId::new(42);
/// assert_eq!(page.as_u32(), 42);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PageId(u32);

impl PageId {
    /// Sentinel for "no page".
    pub const INVALID: Self = Self(u32::MAX);

    /// First valid page ID.
    pub const FIRST: Self = Self(0);

    /// Creates a new `PageId` from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the next page ID.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is a valid page ID.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    /// Returns the byte offset of this page in a file of uniformly sized
    /// pages.
    #[inline]
    #[must_use]
    pub const fn byte_offset(self, page_size: usize) -> u64 {
        self.0 as u64 * page_size as u64
    }
}

impl fmt::Debug for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "PageId(INVALID)")
        } else {
            write!(f, "PageId({})", self.0)
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PageId {
    #[inline]
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<PageId> for u32 {
    #[inline]
    fn from(id: PageId) -> Self {
        id.0
    }
}

/// Log Sequence Number.
///
/// An opaque 64-bit counter carried on each frame. The page cache does not
/// interpret it; it exists so a recovery layer can stamp frames without a
/// format change.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Lsn(u64);

impl Lsn {
    /// Sentinel for "never stamped".
    pub const INVALID: Self = Self(0);

    /// Creates a new `Lsn` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(lsn: u64) -> Self {
        Self(lsn)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks if this is a valid LSN.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Debug for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Lsn(INVALID)")
        } else {
            write!(f, "Lsn({})", self.0)
        }
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Lsn {
    #[inline]
    fn from(lsn: u64) -> Self {
        Self::new(lsn)
    }
}

impl From<Lsn> for u64 {
    #[inline]
    fn from(lsn: Lsn) -> Self {
        lsn.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id() {
        let page = PageId::new(42);
        assert_eq!(page.as_u32(), 42);
        assert!(page.is_valid());
        assert!(!PageId::INVALID.is_valid());

        let next = page.next();
        assert_eq!(next.as_u32(), 43);
    }

    #[test]
    fn test_page_byte_offset() {
        assert_eq!(PageId::new(0).byte_offset(8192), 0);
        assert_eq!(PageId::new(3).byte_offset(8192), 3 * 8192);
        // Offsets past 4 GiB must not wrap
        assert_eq!(
            PageId::new(3000).byte_offset(2 * 1024 * 1024),
            3000u64 * 2 * 1024 * 1024
        );
    }

    #[test]
    fn test_lsn() {
        let lsn = Lsn::new(1000);
        assert_eq!(lsn.as_u64(), 1000);
        assert!(lsn.is_valid());
        assert!(!Lsn::INVALID.is_valid());
    }

    #[test]
    fn test_ordering() {
        assert!(PageId::new(1) < PageId::new(2));
        assert!(Lsn::new(1) < Lsn::new(2));
    }
}

//! System-wide constants for EmberDB.

// =============================================================================
// Page Constants
// =============================================================================

/// The page sizes a deployment may configure, in ascending order.
pub const SUPPORTED_PAGE_SIZES: [usize; 4] = [
    8 * 1024,
    16 * 1024,
    32 * 1024,
    2 * 1024 * 1024,
];

/// Smallest supported page size (8 KB).
pub const MIN_PAGE_SIZE: usize = 8 * 1024;

/// Largest supported page size (2 MB).
pub const MAX_PAGE_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// Pool Constants
// =============================================================================

/// Hard cap on resident pool memory (4 GiB). Layouts whose first range
/// exceeds this are rejected at construction.
pub const MAX_POOL_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Number of descriptors the uncached pool opens over the backing file.
/// Workers select `fds[worker_index % FD_POOL_SIZE]`.
pub const FD_POOL_SIZE: usize = 32;

// =============================================================================
// Server Constants
// =============================================================================

/// Per-worker staging buffer, sized for the largest supported page.
pub const STAGING_BUFFER_SIZE: usize = MAX_PAGE_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_sizes_ascending() {
        for pair in SUPPORTED_PAGE_SIZES.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(SUPPORTED_PAGE_SIZES[0], MIN_PAGE_SIZE);
        assert_eq!(SUPPORTED_PAGE_SIZES[3], MAX_PAGE_SIZE);
    }

    #[test]
    fn test_staging_fits_largest_page() {
        assert!(STAGING_BUFFER_SIZE >= MAX_PAGE_SIZE);
    }

    #[test]
    fn test_pool_cap() {
        // The cap must admit a useful number of even the largest pages.
        assert!(MAX_POOL_BYTES / MAX_PAGE_SIZE as u64 >= 1024);
    }
}

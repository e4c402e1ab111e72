//! The concurrent pinned-page LRU cache.
//!
//! The pool keeps a fixed number of page frames in memory and serves page
//! reads and writes against them:
//!
//! - **Page table**: page number -> frame, paired with a recency order
//! - **Pin counts**: pinned frames are never evicted
//! - **Per-frame latches**: many readers or one writer per page
//! - **Write-back**: dirty frames flush on eviction and at shutdown
//!
//! # Architecture
//!
//! ```text
//! read_page / write_page
//!         │
//!         ▼
//!     ┌────────────────────────────────┐
//!     │ LruPool                        │
//!     │   Mutex<PageTable>             │   pool mutex: lookup, touch,
//!     │     HashMap<PageId, Frame>     │   evict, load, insert
//!     │     recency list (MRU..LRU)    │
//!     └────────────────────────────────┘
//!         │ PinGuard (released mutex)
//!         ▼
//!     ┌────────────────────────────────┐
//!     │ Frame                          │   per-frame RwLock latch:
//!     │   data, pin_count, dirty,      │   byte copies, load, flush
//!     │   loaded, lsn                  │
//!     └────────────────────────────────┘
//!         │
//!         ▼
//!     DataFile (positional I/O)
//! ```

mod error;
mod eviction;
mod frame;
mod pin;
mod pool;
mod table;

pub use error::{BufferError, BufferResult};
pub use eviction::LruReplacer;
pub use frame::Frame;
pub use pin::PinGuard;
pub use pool::LruPool;
pub use table::PageTable;

use crate::store::HitRate;

/// Snapshot of pool state for monitoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    /// Hit/miss counters.
    pub rate: HitRate,
    /// Frames currently resident.
    pub resident_frames: usize,
    /// Resident frames with unpersisted writes.
    pub dirty_frames: usize,
    /// Resident frames with a non-zero pin count.
    pub pinned_frames: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = PoolStats::default();
        assert_eq!(stats.rate.total(), 0);
        assert_eq!(stats.resident_frames, 0);
    }
}

//! The LRU page pool.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ember_common::config::PageLayout;
use ember_common::types::PageId;
use parking_lot::Mutex;
use tracing::{error, info, warn};

use super::error::{BufferError, BufferResult};
use super::eviction::LruReplacer;
use super::frame::Frame;
use super::pin::PinGuard;
use super::table::PageTable;
use super::PoolStats;
use crate::file::DataFile;
use crate::store::{HitRate, PageStore, StoreResult};

/// A fixed-capacity cache of page frames with LRU eviction.
///
/// The pool owns one mutex protecting the page table (index + recency
/// order together). The mutex is held across lookup, eviction, load, and
/// insert, and released before page bytes are copied in or out; the copy
/// itself happens under the frame's own latch while a [`PinGuard`] keeps
/// the frame non-evictable.
///
/// Lock order is pool mutex before frame latch, never the reverse, and no
/// thread takes two frame latches at once.
pub struct LruPool {
    /// Backing file. Positional I/O, so one descriptor suffices.
    file: DataFile,
    /// Uniform page size, from the first layout range.
    page_size: usize,
    /// Maximum resident frames, from the first layout range.
    capacity: usize,
    /// Index and recency order, updated together.
    table: Mutex<PageTable>,
    /// Operations served from a resident frame.
    hits: AtomicU64,
    /// Operations that loaded from disk.
    misses: AtomicU64,
}

impl LruPool {
    /// Opens the backing file and creates an empty pool.
    ///
    /// The first layout range fixes the uniform page size and the
    /// capacity; further ranges are ignored by this pool (heterogeneous
    /// layouts are served uncached by `DirectPool`).
    pub fn open(path: impl AsRef<Path>, layout: &PageLayout) -> BufferResult<Self> {
        layout
            .validate()
            .map_err(|e| BufferError::config(e.to_string()))?;
        let (page_size, capacity) = layout.first_range().expect("validated layout");
        if layout.len() > 1 {
            warn!(
                ranges = layout.len(),
                "LRU pool caches only the first page-size range"
            );
        }

        let file = DataFile::open(path)?;
        info!(
            capacity,
            page_size,
            path = %file.path().display(),
            "page cache initialised"
        );

        Ok(Self {
            file,
            page_size,
            capacity,
            table: Mutex::new(PageTable::with_capacity(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Returns the uniform page size in bytes.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the maximum number of resident frames.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the page is resident.
    pub fn contains(&self, no: PageId) -> bool {
        self.table.lock().contains(no)
    }

    /// Returns a pinned handle to the page's frame, loading it on miss.
    ///
    /// Under the pool mutex: a hit touches the recency order and counts;
    /// a miss evicts if the pool is full, loads the frame from disk while
    /// the mutex is still held (no partially loaded frame is ever visible
    /// in the index), and publishes it. The pin is taken before the mutex
    /// is released, so eviction never sees a zero pin count on a frame a
    /// caller is about to use.
    ///
    /// A failed load leaves the index unchanged and counts neither a hit
    /// nor a miss.
    pub fn fetch_page(&self, no: PageId) -> BufferResult<PinGuard> {
        let mut table = self.table.lock();

        if let Some(frame) = table.get(no) {
            let guard = PinGuard::new(Arc::clone(frame));
            table.touch(no);
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(guard);
        }

        let file = &self.file;
        let page_size = self.page_size;
        LruReplacer::evict_if_full(&mut table, self.capacity, |frame| {
            frame.flush_to(file, frame.id().byte_offset(page_size))?;
            Ok(())
        })?;

        let frame = Arc::new(Frame::new(no, page_size));
        frame.load_from(file, no.byte_offset(page_size))?;

        let guard = PinGuard::new(Arc::clone(&frame));
        table.insert(no, frame);
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(guard)
    }

    /// Copies a resident page's bytes into `buf`, loading it on miss.
    ///
    /// Returns the number of bytes copied: `min(buf.len(), page_size)`.
    pub fn read_page(&self, no: PageId, buf: &mut [u8]) -> BufferResult<usize> {
        let guard = self.fetch_page(no)?;
        // Pool mutex released; the copy runs under the frame latch only.
        Ok(guard.read_at(0, buf))
    }

    /// Overwrites a page from `buf` and marks it dirty.
    ///
    /// Returns the number of bytes copied: `min(buf.len(), page_size)`.
    pub fn write_page(&self, no: PageId, buf: &[u8]) -> BufferResult<usize> {
        let guard = self.fetch_page(no)?;
        Ok(guard.write_at(0, buf))
    }

    /// Writes every resident dirty frame back to the file.
    ///
    /// Returns the number of frames flushed.
    pub fn flush_all(&self) -> BufferResult<usize> {
        let table = self.table.lock();
        let mut flushed = 0;
        for (id, frame) in table.iter_frames() {
            if frame.is_dirty() {
                frame.flush_to(&self.file, id.byte_offset(self.page_size))?;
                flushed += 1;
            }
        }
        Ok(flushed)
    }

    /// Returns hit/miss counters.
    pub fn hit_rate(&self) -> HitRate {
        HitRate {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Returns a snapshot of pool statistics.
    pub fn stats(&self) -> PoolStats {
        let table = self.table.lock();
        let mut dirty = 0;
        let mut pinned = 0;
        for (_, frame) in table.iter_frames() {
            if frame.is_dirty() {
                dirty += 1;
            }
            if frame.is_pinned() {
                pinned += 1;
            }
        }
        PoolStats {
            rate: self.hit_rate(),
            resident_frames: table.len(),
            dirty_frames: dirty,
            pinned_frames: pinned,
        }
    }
}

impl Drop for LruPool {
    fn drop(&mut self) {
        if let Err(e) = self.flush_all() {
            error!(error = %e, "failed to flush dirty pages at shutdown");
        }
    }
}

impl std::fmt::Debug for LruPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruPool")
            .field("page_size", &self.page_size)
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

impl PageStore for LruPool {
    fn read_page(
        &self,
        no: PageId,
        page_size: usize,
        buf: &mut [u8],
        _worker: usize,
    ) -> StoreResult<()> {
        let n = page_size.min(buf.len());
        LruPool::read_page(self, no, &mut buf[..n])?;
        Ok(())
    }

    fn write_page(
        &self,
        no: PageId,
        page_size: usize,
        buf: &[u8],
        _worker: usize,
    ) -> StoreResult<()> {
        let n = page_size.min(buf.len());
        LruPool::write_page(self, no, &buf[..n])?;
        Ok(())
    }

    fn hit_rate(&self) -> Option<HitRate> {
        Some(LruPool::hit_rate(self))
    }

    fn flush(&self) -> StoreResult<()> {
        self.flush_all()?;
        Ok(())
    }
}

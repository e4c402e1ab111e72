//! Buffer frame - one resident page and its metadata.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};

use ember_common::types::{Lsn, PageId};
use parking_lot::RwLock;

use crate::file::{DataFile, FileResult};

/// A frame holds a single page's bytes in memory.
///
/// Each frame owns:
/// - the page buffer, guarded by a per-frame reader-writer latch
/// - a pin count (frames with `pin_count > 0` are never evicted)
/// - `dirty` / `loaded` flags tracking write-back state
///
/// Pin count and the flags are atomics, independent of both the latch and
/// the pool mutex; they may be inspected without holding either lock.
pub struct Frame {
    /// Page number. Immutable after construction.
    id: PageId,
    /// Buffer length in bytes. Immutable after construction.
    size: usize,
    /// Page data, zero-initialised at construction.
    data: RwLock<Box<[u8]>>,
    /// Number of active references holding this frame non-evictable.
    pin_count: AtomicI32,
    /// True when the buffer holds writes not yet persisted.
    dirty: AtomicBool,
    /// True once the buffer reflects the on-disk page or a client write.
    loaded: AtomicBool,
    /// Informational log sequence number; not interpreted here.
    lsn: AtomicU64,
}

impl Frame {
    /// Creates a frame for page `id` with a zeroed `size`-byte buffer.
    ///
    /// The new frame starts unloaded: reads return no bytes until the
    /// frame is loaded from disk or written to.
    pub fn new(id: PageId, size: usize) -> Self {
        Self {
            id,
            size,
            data: RwLock::new(vec![0u8; size].into_boxed_slice()),
            pin_count: AtomicI32::new(0),
            dirty: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            lsn: AtomicU64::new(Lsn::INVALID.as_u64()),
        }
    }

    /// Returns the page number.
    #[inline]
    pub fn id(&self) -> PageId {
        self.id
    }

    /// Returns the buffer size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the current pin count.
    #[inline]
    pub fn pin_count(&self) -> i32 {
        self.pin_count.load(Ordering::Acquire)
    }

    /// Returns true if the frame is pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Increments the pin count.
    #[inline]
    pub fn pin(&self) {
        self.pin_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrements the pin count and returns the new value.
    ///
    /// An unpin on an already-unpinned frame clamps the count to 0 and
    /// returns 0 rather than going negative.
    #[inline]
    pub fn unpin(&self) -> i32 {
        let prev = self.pin_count.fetch_sub(1, Ordering::AcqRel);
        if prev <= 0 {
            self.pin_count.store(0, Ordering::Release);
            return 0;
        }
        prev - 1
    }

    /// Returns true if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Returns true if the buffer content is meaningful.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Returns the frame's LSN.
    #[inline]
    pub fn lsn(&self) -> Lsn {
        Lsn::new(self.lsn.load(Ordering::Acquire))
    }

    /// Sets the frame's LSN.
    #[inline]
    pub fn set_lsn(&self, lsn: Lsn) {
        self.lsn.store(lsn.as_u64(), Ordering::Release);
    }

    /// Copies page bytes starting at `offset` into `out`.
    ///
    /// Takes the latch in shared mode; concurrent readers proceed in
    /// parallel. Returns the number of bytes copied:
    /// `min(out.len(), size - offset)`, or 0 when `offset >= size` or the
    /// frame is not loaded.
    pub fn read_at(&self, offset: usize, out: &mut [u8]) -> usize {
        if offset >= self.size {
            return 0;
        }
        let data = self.data.read();
        if !self.is_loaded() {
            return 0;
        }
        let n = out.len().min(self.size - offset);
        out[..n].copy_from_slice(&data[offset..offset + n]);
        n
    }

    /// Copies `src` into the page buffer starting at `offset`.
    ///
    /// Takes the latch in exclusive mode, marks the frame loaded and
    /// dirty, and returns the number of bytes copied:
    /// `min(src.len(), size - offset)`, or 0 when `offset >= size` (the
    /// dirty flag is left unchanged in that case).
    pub fn write_at(&self, offset: usize, src: &[u8]) -> usize {
        if offset >= self.size {
            return 0;
        }
        let mut data = self.data.write();
        let n = src.len().min(self.size - offset);
        data[offset..offset + n].copy_from_slice(&src[..n]);
        self.loaded.store(true, Ordering::Release);
        self.dirty.store(true, Ordering::Release);
        n
    }

    /// Fills the buffer from the backing file at `offset`.
    ///
    /// Holds the latch exclusively for the duration of the read. A page
    /// past end-of-file reads as zeroes. On success the frame is loaded
    /// and clean.
    pub fn load_from(&self, file: &DataFile, offset: u64) -> FileResult<()> {
        let mut data = self.data.write();
        file.read_full_at(&mut data, offset)?;
        self.loaded.store(true, Ordering::Release);
        self.dirty.store(false, Ordering::Release);
        Ok(())
    }

    /// Writes the buffer back to the backing file at `offset`.
    ///
    /// Returns `Ok(false)` when the frame was never loaded (nothing to
    /// persist) and `Ok(true)` when the frame is clean on return. A dirty
    /// frame is snapshotted under the shared latch and the latch released
    /// before the disk write, so readers are not blocked for the duration
    /// of the I/O.
    pub fn flush_to(&self, file: &DataFile, offset: u64) -> FileResult<bool> {
        let scratch = {
            let data = self.data.read();
            if !self.is_loaded() {
                return Ok(false);
            }
            if !self.is_dirty() {
                return Ok(true);
            }
            data.to_vec()
        };
        file.write_all_at(&scratch, offset)?;
        self.dirty.store(false, Ordering::Release);
        Ok(true)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("pin_count", &self.pin_count())
            .field("dirty", &self.is_dirty())
            .field("loaded", &self.is_loaded())
            .field("lsn", &self.lsn())
            .finish()
    }
}

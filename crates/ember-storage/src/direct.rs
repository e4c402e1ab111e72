//! The uncached direct pool.
//!
//! Every read and write goes straight to the backing file; nothing is
//! cached. Unlike the LRU pool this pool supports heterogeneous page
//! sizes: the layout's ranges are laid out contiguously in ascending size
//! order and each page's byte offset is computed by scanning the layout.
//!
//! Because every operation hits the kernel, the pool keeps a small fixed
//! set of duplicated descriptors and each worker uses
//! `fds[worker_index % N]` to spread contention.

use std::path::Path;

use ember_common::config::PageLayout;
use ember_common::constants::FD_POOL_SIZE;
use ember_common::types::PageId;
use tracing::info;

use crate::file::DataFile;
use crate::store::{PageStore, StoreError, StoreResult};

/// Uncached positional-I/O pool over the backing file.
pub struct DirectPool {
    /// Duplicated descriptors, indexed by worker.
    files: Vec<DataFile>,
    /// Page layout; fixes every page's byte offset.
    layout: PageLayout,
}

impl DirectPool {
    /// Opens the backing file and duplicates the descriptor set.
    pub fn open(path: impl AsRef<Path>, layout: &PageLayout) -> StoreResult<Self> {
        layout.validate()?;

        let base = DataFile::open(path)?;
        let mut files = Vec::with_capacity(FD_POOL_SIZE);
        for _ in 1..FD_POOL_SIZE {
            files.push(base.try_clone()?);
        }
        files.push(base);

        info!(
            ranges = layout.len(),
            total_pages = layout.total_pages(),
            descriptors = files.len(),
            "direct pool initialised"
        );

        Ok(Self {
            files,
            layout: layout.clone(),
        })
    }

    /// Returns the layout this pool serves.
    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    #[inline]
    fn file_for(&self, worker: usize) -> &DataFile {
        &self.files[worker % self.files.len()]
    }

    fn offset_of(&self, no: PageId) -> StoreResult<u64> {
        self.layout
            .page_offset(no)
            .ok_or(StoreError::OutOfRange { page: no })
    }
}

impl PageStore for DirectPool {
    fn read_page(
        &self,
        no: PageId,
        page_size: usize,
        buf: &mut [u8],
        worker: usize,
    ) -> StoreResult<()> {
        let offset = self.offset_of(no)?;
        let n = page_size.min(buf.len());
        self.file_for(worker).read_full_at(&mut buf[..n], offset)?;
        Ok(())
    }

    fn write_page(
        &self,
        no: PageId,
        page_size: usize,
        buf: &[u8],
        worker: usize,
    ) -> StoreResult<()> {
        let offset = self.offset_of(no)?;
        let n = page_size.min(buf.len());
        self.file_for(worker).write_all_at(&buf[..n], offset)?;
        Ok(())
    }
}

impl std::fmt::Debug for DirectPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectPool")
            .field("descriptors", &self.files.len())
            .field("layout", &self.layout)
            .finish()
    }
}

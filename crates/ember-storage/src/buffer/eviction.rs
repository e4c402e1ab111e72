//! LRU victim selection.
//!
//! The replacer walks the recency order from the least recent end toward
//! the most recent, skipping pinned frames. The first unpinned candidate
//! is written back if dirty and then dropped from the table. Victims are
//! chosen strictly by recency; of two frames touched at indistinguishable
//! times, the one trailing in the list loses.

use std::sync::Arc;

use ember_common::types::PageId;

use super::error::{BufferError, BufferResult};
use super::frame::Frame;
use super::table::PageTable;

/// LRU page replacement.
pub struct LruReplacer;

impl LruReplacer {
    /// Makes room for one page when the table is at `capacity`.
    ///
    /// Below capacity this returns immediately with `Ok(None)`. At
    /// capacity it selects the least recently used unpinned frame, calls
    /// `flush` on it (the write-back hook; a clean frame's flush is a
    /// no-op), removes it from the table, and returns its page number.
    ///
    /// A flush failure aborts the eviction with the victim still
    /// resident and dirty. If every resident frame is pinned the call
    /// fails with [`BufferError::AllPinned`].
    pub fn evict_if_full<F>(
        table: &mut PageTable,
        capacity: usize,
        mut flush: F,
    ) -> BufferResult<Option<PageId>>
    where
        F: FnMut(&Frame) -> BufferResult<()>,
    {
        if table.len() < capacity {
            return Ok(None);
        }

        let victim = table
            .iter_lru()
            .find(|&id| table.get(id).is_some_and(|f| !f.is_pinned()));
        let Some(victim) = victim else {
            return Err(BufferError::AllPinned);
        };

        let frame: Arc<Frame> = Arc::clone(table.get(victim).expect("victim is resident"));
        flush(&frame)?;
        table.remove(victim);
        Ok(Some(victim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(ids: &[u32]) -> PageTable {
        let mut table = PageTable::with_capacity(ids.len());
        for &i in ids {
            table.insert(PageId::new(i), Arc::new(Frame::new(PageId::new(i), 64)));
        }
        table
    }

    fn no_flush(_: &Frame) -> BufferResult<()> {
        Ok(())
    }

    #[test]
    fn test_below_capacity_is_noop() {
        let mut table = table_with(&[1, 2]);
        let evicted = LruReplacer::evict_if_full(&mut table, 3, no_flush).unwrap();
        assert_eq!(evicted, None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_evicts_least_recent() {
        let mut table = table_with(&[1, 2, 3]);
        table.touch(PageId::new(1));

        let evicted = LruReplacer::evict_if_full(&mut table, 3, no_flush).unwrap();
        assert_eq!(evicted, Some(PageId::new(2)));
        assert!(!table.contains(PageId::new(2)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_skips_pinned_victim() {
        let mut table = table_with(&[1, 2, 3]);
        // Page 1 is the LRU candidate; pin it.
        table.get(PageId::new(1)).unwrap().pin();

        let evicted = LruReplacer::evict_if_full(&mut table, 3, no_flush).unwrap();
        assert_eq!(evicted, Some(PageId::new(2)));
        assert!(table.contains(PageId::new(1)));
    }

    #[test]
    fn test_all_pinned_fails_without_eviction() {
        let mut table = table_with(&[1, 2]);
        table.get(PageId::new(1)).unwrap().pin();
        table.get(PageId::new(2)).unwrap().pin();

        let err = LruReplacer::evict_if_full(&mut table, 2, no_flush).unwrap_err();
        assert!(matches!(err, BufferError::AllPinned));
        assert_eq!(table.len(), 2);

        // Unpinning any frame makes the retry succeed.
        table.get(PageId::new(1)).unwrap().unpin();
        let evicted = LruReplacer::evict_if_full(&mut table, 2, no_flush).unwrap();
        assert_eq!(evicted, Some(PageId::new(1)));
    }

    #[test]
    fn test_flush_failure_aborts_eviction() {
        let mut table = table_with(&[1, 2]);

        let err = LruReplacer::evict_if_full(&mut table, 2, |_| {
            Err(BufferError::File(crate::file::FileError::Io {
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk gone"),
            }))
        })
        .unwrap_err();

        assert!(matches!(err, BufferError::File(_)));
        // The victim stays resident.
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_flush_sees_the_victim() {
        let mut table = table_with(&[1, 2, 3]);
        let mut flushed = Vec::new();

        LruReplacer::evict_if_full(&mut table, 3, |frame| {
            flushed.push(frame.id());
            Ok(())
        })
        .unwrap();

        assert_eq!(flushed, vec![PageId::new(1)]);
    }
}

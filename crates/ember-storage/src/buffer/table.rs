//! The page table: index plus recency order.
//!
//! Maps page numbers to resident frames and keeps every resident page on a
//! doubly-linked recency list, newest first. The two structures are always
//! updated together - a page in the index is on the list exactly once, and
//! removal unlinks both - and the pool guards the whole table with a
//! single mutex. All operations are O(1) amortised except the victim scan,
//! which walks from the least recent end.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::ptr::NonNull;
use std::sync::Arc;

use ember_common::types::PageId;

use super::frame::Frame;

/// A node in the recency list.
struct Node {
    id: PageId,
    /// Toward the most recent end.
    prev: Option<NonNull<Node>>,
    /// Toward the least recent end.
    next: Option<NonNull<Node>>,
}

impl Node {
    fn new(id: PageId) -> Self {
        Self {
            id,
            prev: None,
            next: None,
        }
    }
}

/// Index of resident frames with an intrusive recency order.
pub struct PageTable {
    /// Page number -> frame handle.
    frames: HashMap<PageId, Arc<Frame>>,
    /// Page number -> recency list node.
    nodes: HashMap<PageId, NonNull<Node>>,
    /// Most recently used end.
    head: Option<NonNull<Node>>,
    /// Least recently used end.
    tail: Option<NonNull<Node>>,
}

// Safety: PageTable owns all of its nodes; the raw pointers never escape.
unsafe impl Send for PageTable {}

impl PageTable {
    /// Creates an empty table sized for `capacity` resident pages.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: HashMap::with_capacity(capacity),
            nodes: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Returns the number of resident pages.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if no pages are resident.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Looks up a resident frame without updating recency.
    pub fn get(&self, id: PageId) -> Option<&Arc<Frame>> {
        self.frames.get(&id)
    }

    /// Returns true if the page is resident.
    pub fn contains(&self, id: PageId) -> bool {
        self.frames.contains_key(&id)
    }

    /// Inserts a frame and pushes its page to the front of the recency
    /// order. The page must not already be resident.
    pub fn insert(&mut self, id: PageId, frame: Arc<Frame>) {
        debug_assert!(!self.frames.contains_key(&id));
        self.frames.insert(id, frame);

        let node = Box::new(Node::new(id));
        let node_ptr = NonNull::from(Box::leak(node));
        self.push_front(node_ptr);
        self.nodes.insert(id, node_ptr);
    }

    /// Moves a resident page to the front of the recency order.
    ///
    /// Returns false if the page is not resident.
    pub fn touch(&mut self, id: PageId) -> bool {
        match self.nodes.get(&id) {
            Some(&node_ptr) => {
                self.move_to_front(node_ptr);
                true
            }
            None => false,
        }
    }

    /// Removes a page from both the index and the recency order,
    /// returning its frame handle.
    pub fn remove(&mut self, id: PageId) -> Option<Arc<Frame>> {
        let frame = self.frames.remove(&id)?;
        if let Some(node_ptr) = self.nodes.remove(&id) {
            self.unlink(node_ptr);
            // Safety: removed from the map above, so we own the node now.
            drop(unsafe { Box::from_raw(node_ptr.as_ptr()) });
        }
        Some(frame)
    }

    /// Iterates resident page numbers from least recent to most recent.
    pub fn iter_lru(&self) -> LruIter<'_> {
        LruIter {
            cur: self.tail,
            _marker: PhantomData,
        }
    }

    /// Iterates over all resident frames in no particular order.
    pub fn iter_frames(&self) -> impl Iterator<Item = (PageId, &Arc<Frame>)> {
        self.frames.iter().map(|(&id, frame)| (id, frame))
    }

    /// Moves a node to the front of the list.
    fn move_to_front(&mut self, node_ptr: NonNull<Node>) {
        if Some(node_ptr) == self.head {
            return;
        }
        self.unlink(node_ptr);
        self.push_front(node_ptr);
    }

    /// Pushes a node to the front of the list.
    fn push_front(&mut self, node_ptr: NonNull<Node>) {
        unsafe {
            (*node_ptr.as_ptr()).prev = None;
            (*node_ptr.as_ptr()).next = self.head;

            if let Some(head) = self.head {
                (*head.as_ptr()).prev = Some(node_ptr);
            }

            self.head = Some(node_ptr);

            if self.tail.is_none() {
                self.tail = Some(node_ptr);
            }
        }
    }

    /// Unlinks a node from the list.
    fn unlink(&mut self, node_ptr: NonNull<Node>) {
        unsafe {
            let prev = (*node_ptr.as_ptr()).prev;
            let next = (*node_ptr.as_ptr()).next;

            if let Some(prev) = prev {
                (*prev.as_ptr()).next = next;
            } else {
                self.head = next;
            }

            if let Some(next) = next {
                (*next.as_ptr()).prev = prev;
            } else {
                self.tail = prev;
            }
        }
    }

    /// Returns the recency order from most recent to least recent.
    #[cfg(test)]
    fn recency_order(&self) -> Vec<PageId> {
        let mut out = Vec::with_capacity(self.len());
        let mut cur = self.head;
        while let Some(node_ptr) = cur {
            unsafe {
                out.push((*node_ptr.as_ptr()).id);
                cur = (*node_ptr.as_ptr()).next;
            }
        }
        out
    }
}

impl Drop for PageTable {
    fn drop(&mut self) {
        let mut cur = self.head;
        while let Some(node_ptr) = cur {
            unsafe {
                cur = (*node_ptr.as_ptr()).next;
                drop(Box::from_raw(node_ptr.as_ptr()));
            }
        }
    }
}

impl std::fmt::Debug for PageTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTable")
            .field("resident", &self.len())
            .finish()
    }
}

/// Iterator over resident page numbers, least recent first.
pub struct LruIter<'a> {
    cur: Option<NonNull<Node>>,
    _marker: PhantomData<&'a PageTable>,
}

impl Iterator for LruIter<'_> {
    type Item = PageId;

    fn next(&mut self) -> Option<Self::Item> {
        let node_ptr = self.cur?;
        // Safety: the borrow on the table keeps the list intact.
        unsafe {
            self.cur = (*node_ptr.as_ptr()).prev;
            Some((*node_ptr.as_ptr()).id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u32) -> Arc<Frame> {
        Arc::new(Frame::new(PageId::new(id), 64))
    }

    fn ids(v: &[u32]) -> Vec<PageId> {
        v.iter().map(|&i| PageId::new(i)).collect()
    }

    #[test]
    fn test_insert_pushes_front() {
        let mut table = PageTable::with_capacity(4);
        table.insert(PageId::new(1), frame(1));
        table.insert(PageId::new(2), frame(2));
        table.insert(PageId::new(3), frame(3));

        assert_eq!(table.len(), 3);
        assert_eq!(table.recency_order(), ids(&[3, 2, 1]));
    }

    #[test]
    fn test_touch_moves_to_front() {
        let mut table = PageTable::with_capacity(4);
        table.insert(PageId::new(1), frame(1));
        table.insert(PageId::new(2), frame(2));
        table.insert(PageId::new(3), frame(3));

        assert!(table.touch(PageId::new(1)));
        assert_eq!(table.recency_order(), ids(&[1, 3, 2]));

        // Touching the front is a no-op.
        assert!(table.touch(PageId::new(1)));
        assert_eq!(table.recency_order(), ids(&[1, 3, 2]));

        assert!(!table.touch(PageId::new(9)));
    }

    #[test]
    fn test_remove_unlinks_both_structures() {
        let mut table = PageTable::with_capacity(4);
        table.insert(PageId::new(1), frame(1));
        table.insert(PageId::new(2), frame(2));
        table.insert(PageId::new(3), frame(3));

        let removed = table.remove(PageId::new(2)).unwrap();
        assert_eq!(removed.id(), PageId::new(2));
        assert!(!table.contains(PageId::new(2)));
        assert_eq!(table.recency_order(), ids(&[3, 1]));

        assert!(table.remove(PageId::new(2)).is_none());
    }

    #[test]
    fn test_remove_head_and_tail() {
        let mut table = PageTable::with_capacity(4);
        table.insert(PageId::new(1), frame(1));
        table.insert(PageId::new(2), frame(2));

        table.remove(PageId::new(2)).unwrap();
        assert_eq!(table.recency_order(), ids(&[1]));
        table.remove(PageId::new(1)).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.recency_order(), ids(&[]));
    }

    #[test]
    fn test_iter_lru_least_recent_first() {
        let mut table = PageTable::with_capacity(4);
        table.insert(PageId::new(1), frame(1));
        table.insert(PageId::new(2), frame(2));
        table.insert(PageId::new(3), frame(3));
        table.touch(PageId::new(2));

        let lru: Vec<PageId> = table.iter_lru().collect();
        assert_eq!(lru, ids(&[1, 3, 2]));
    }

    #[test]
    fn test_index_and_recency_stay_consistent() {
        let mut table = PageTable::with_capacity(8);
        for i in 0..8 {
            table.insert(PageId::new(i), frame(i));
        }
        table.touch(PageId::new(3));
        table.remove(PageId::new(5));
        table.remove(PageId::new(0));
        table.insert(PageId::new(9), frame(9));

        // Every indexed page appears on the list exactly once, and vice
        // versa.
        let mut order = table.recency_order();
        order.sort();
        let mut indexed: Vec<PageId> = table.iter_frames().map(|(id, _)| id).collect();
        indexed.sort();
        assert_eq!(order, indexed);
        assert_eq!(table.len(), order.len());
    }
}

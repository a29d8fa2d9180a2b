//! Concurrent skip list: one external writer, many lock-free readers.
//!
//! ## Thread safety
//!
//! Writes require external synchronization (one `insert` at a time, most
//! likely under the owning engine's write mutex). Reads only require that
//! the list outlive the read; beyond that they run with no locking at
//! all. That works because of two invariants:
//!
//! 1. Nodes are never deleted until the whole list is dropped.
//! 2. A node's contents other than its forward pointers are immutable
//!    once the node is linked in. `insert` initializes a node fully and
//!    then publishes it with release-stores, so a reader that observes a
//!    pointer through an acquire-load sees an initialized node.
//!
//! `max_height` is read and written with relaxed ordering: a reader that
//! sees a stale (smaller) height just misses the newest top levels and
//! falls through to lower ones; a reader that sees the new height before
//! the new node's upper links sees null there, which sorts after every
//! key, and likewise drops a level.

use std::cmp::Ordering;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering as AtomicOrdering};

use rand::Rng;

/// Height cap; with branching factor 4 this comfortably covers many
/// millions of entries.
const MAX_HEIGHT: usize = 12;

/// 1-in-4 chance of growing a level taller.
const BRANCHING: u32 = 4;

/// Ordering over the encoded keys stored in the list.
pub trait KeyComparator: Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

struct Node {
    key: Vec<u8>,
    // Forward pointers, one per level in [0, height).
    next: Box<[AtomicPtr<Node>]>,
}

impl Node {
    fn new(key: Vec<u8>, height: usize) -> *mut Node {
        let next = (0..height)
            .map(|_| AtomicPtr::new(ptr::null_mut()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Box::into_raw(Box::new(Node { key, next }))
    }

    /// Acquire-load so the caller observes a fully initialized node.
    fn next(&self, level: usize) -> *mut Node {
        self.next[level].load(AtomicOrdering::Acquire)
    }

    /// Release-store so anybody reading through this pointer observes a
    /// fully initialized version of the inserted node.
    fn set_next(&self, level: usize, node: *mut Node) {
        self.next[level].store(node, AtomicOrdering::Release);
    }

    // No-barrier variants, safe only in the spots insert() uses them.
    fn no_barrier_next(&self, level: usize) -> *mut Node {
        self.next[level].load(AtomicOrdering::Relaxed)
    }

    fn no_barrier_set_next(&self, level: usize, node: *mut Node) {
        self.next[level].store(node, AtomicOrdering::Relaxed);
    }
}

pub struct SkipList<C: KeyComparator> {
    cmp: C,
    head: *mut Node,
    // Height of the entire list. Modified only by insert(); read racily
    // by readers (stale values are fine, see module docs).
    max_height: AtomicUsize,
}

// The raw node pointers are published with release/acquire discipline
// and nodes are never freed while the list is alive.
unsafe impl<C: KeyComparator> Send for SkipList<C> {}
unsafe impl<C: KeyComparator> Sync for SkipList<C> {}

impl<C: KeyComparator> SkipList<C> {
    pub fn new(cmp: C) -> SkipList<C> {
        SkipList {
            cmp,
            head: Node::new(Vec::new(), MAX_HEIGHT),
            max_height: AtomicUsize::new(1),
        }
    }

    /// Inserts `key` into the list.
    ///
    /// Requires external synchronization: at most one `insert` may run at
    /// a time. Requires that nothing comparing equal to `key` is already
    /// in the list (debug-asserted; callers encode a unique sequence
    /// number into every key).
    pub fn insert(&self, key: Vec<u8>) {
        let mut prev = [ptr::null_mut(); MAX_HEIGHT];
        let x = self.find_greater_or_equal(&key, Some(&mut prev));

        // Duplicate insertion is a caller bug, not a recoverable error.
        debug_assert!(
            x.is_null() || self.cmp.compare(unsafe { &(*x).key }, &key) != Ordering::Equal,
            "duplicate key inserted into skip list"
        );

        let height = random_height();
        if height > self.max_height() {
            for p in prev.iter_mut().take(height).skip(self.max_height()) {
                *p = self.head;
            }
            // Relaxed is fine: see the module docs on stale heights.
            self.max_height.store(height, AtomicOrdering::Relaxed);
        }

        let x = Node::new(key, height);
        for (level, &p) in prev.iter().enumerate().take(height) {
            unsafe {
                // No-barrier copy of the successor suffices; the release
                // store below is the publication point.
                (*x).no_barrier_set_next(level, (*p).no_barrier_next(level));
                (*p).set_next(level, x);
            }
        }
    }

    /// True iff an entry comparing equal to `key` is in the list.
    ///
    /// `MemTable` resolves lookups through `iter().seek(..)` instead, so
    /// only the list's own tests call this.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn contains(&self, key: &[u8]) -> bool {
        let x = self.find_greater_or_equal(key, None);
        !x.is_null() && self.cmp.compare(unsafe { &(*x).key }, key) == Ordering::Equal
    }

    pub fn iter(&self) -> SkipListIter<'_, C> {
        SkipListIter {
            list: self,
            node: ptr::null(),
        }
    }

    fn max_height(&self) -> usize {
        self.max_height.load(AtomicOrdering::Relaxed)
    }

    /// True if `key` sorts after the key stored in `node` (null sorts
    /// after everything).
    fn key_is_after_node(&self, key: &[u8], node: *mut Node) -> bool {
        !node.is_null() && self.cmp.compare(unsafe { &(*node).key }, key) == Ordering::Less
    }

    /// Earliest node at or after `key`, or null. Fills `prev[level]`
    /// with the last node visited before the result at every level.
    fn find_greater_or_equal(
        &self,
        key: &[u8],
        mut prev: Option<&mut [*mut Node; MAX_HEIGHT]>,
    ) -> *mut Node {
        let mut x = self.head;
        let mut level = self.max_height() - 1;
        loop {
            let next = unsafe { (*x).next(level) };
            if self.key_is_after_node(key, next) {
                x = next;
            } else {
                if let Some(prev) = prev.as_deref_mut() {
                    prev[level] = x;
                }
                if level == 0 {
                    return next;
                }
                level -= 1;
            }
        }
    }

    /// Latest node with a key strictly less than `key`, or the head
    /// sentinel if there is none.
    fn find_less_than(&self, key: &[u8]) -> *mut Node {
        let mut x = self.head;
        let mut level = self.max_height() - 1;
        loop {
            let next = unsafe { (*x).next(level) };
            if next.is_null()
                || self.cmp.compare(unsafe { &(*next).key }, key) != Ordering::Less
            {
                if level == 0 {
                    return x;
                }
                level -= 1;
            } else {
                x = next;
            }
        }
    }

    /// Last node in the list, or the head sentinel if empty.
    fn find_last(&self) -> *mut Node {
        let mut x = self.head;
        let mut level = self.max_height() - 1;
        loop {
            let next = unsafe { (*x).next(level) };
            if next.is_null() {
                if level == 0 {
                    return x;
                }
                level -= 1;
            } else {
                x = next;
            }
        }
    }
}

impl<C: KeyComparator> Drop for SkipList<C> {
    fn drop(&mut self) {
        // Exclusive access here; walk level 0 and free every node.
        let mut node = self.head;
        while !node.is_null() {
            let next = unsafe { (*node).no_barrier_next(0) };
            drop(unsafe { Box::from_raw(node) });
            node = next;
        }
    }
}

/// Grows 1 level at a time with probability 1/BRANCHING, capped at
/// MAX_HEIGHT. A higher branching factor means a shorter list and less
/// memory than the textbook 1/2.
fn random_height() -> usize {
    let mut rng = rand::thread_rng();
    let mut height = 1;
    while height < MAX_HEIGHT && rng.gen_ratio(1, BRANCHING) {
        height += 1;
    }
    height
}

/// Cursor over the list. Forward `next` follows the level-0 pointer in
/// O(1); `prev` has no back links and re-searches from the head, O(log n)
/// per call.
pub struct SkipListIter<'a, C: KeyComparator> {
    list: &'a SkipList<C>,
    node: *const Node,
}

impl<'a, C: KeyComparator> SkipListIter<'a, C> {
    pub fn valid(&self) -> bool {
        !self.node.is_null()
    }

    /// Requires `valid()`.
    pub fn key(&self) -> &'a [u8] {
        debug_assert!(self.valid());
        unsafe { &(*self.node).key }
    }

    /// Requires `valid()`.
    pub fn next(&mut self) {
        debug_assert!(self.valid());
        self.node = unsafe { (*self.node).next(0) };
    }

    /// Requires `valid()`. Re-searches for the last node before the
    /// current key instead of following back links.
    pub fn prev(&mut self) {
        debug_assert!(self.valid());
        let node = self.list.find_less_than(unsafe { &(*self.node).key });
        self.node = if node == self.list.head {
            ptr::null()
        } else {
            node
        };
    }

    /// Positions at the first entry with key >= `target`.
    pub fn seek(&mut self, target: &[u8]) {
        self.node = self.list.find_greater_or_equal(target, None);
    }

    pub fn seek_to_first(&mut self) {
        self.node = unsafe { (*self.list.head).next(0) };
    }

    pub fn seek_to_last(&mut self) {
        let node = self.list.find_last();
        self.node = if node == self.list.head {
            ptr::null()
        } else {
            node
        };
    }
}

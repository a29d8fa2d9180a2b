use crate::error::{Error, Result};

/// Cursor over a sorted sequence of key/value byte strings.
///
/// An iterator is either positioned at an entry or invalid. `key` and
/// `value` require a valid position (debug-asserted; undefined results
/// otherwise). Errors encountered while moving latch into `status()` and
/// invalidate the position; they are never panics.
pub trait Iter {
    /// True iff the iterator is positioned at an entry.
    fn valid(&self) -> bool;

    /// Position at the first entry. Valid afterwards iff the source is
    /// not empty.
    fn seek_to_first(&mut self);

    /// Position at the last entry. Valid afterwards iff the source is
    /// not empty.
    fn seek_to_last(&mut self);

    /// Position at the first entry with key >= `target`.
    fn seek(&mut self, target: &[u8]);

    /// Advance to the next entry. Requires `valid()`.
    fn next(&mut self);

    /// Retreat to the previous entry. Requires `valid()`.
    fn prev(&mut self);

    /// Key at the current entry. Requires `valid()`; the slice is only
    /// good until the iterator moves.
    fn key(&self) -> &[u8];

    /// Value at the current entry. Requires `valid()`; the slice is only
    /// good until the iterator moves.
    fn value(&self) -> &[u8];

    /// First error encountered, if any.
    fn status(&self) -> Result<()>;
}

/// An iterator over nothing, optionally carrying a latched error.
///
/// Doubles as the error iterator: a component that fails to produce a
/// real iterator hands back `EmptyIter::with_status(err)` so the failure
/// propagates through `status()` instead of unwinding.
pub struct EmptyIter {
    status: Result<()>,
}

impl EmptyIter {
    #[must_use]
    pub fn new() -> EmptyIter {
        EmptyIter { status: Ok(()) }
    }

    #[must_use]
    pub fn with_status(status: Error) -> EmptyIter {
        EmptyIter {
            status: Err(status),
        }
    }
}

impl Default for EmptyIter {
    fn default() -> Self {
        EmptyIter::new()
    }
}

impl Iter for EmptyIter {
    fn valid(&self) -> bool {
        false
    }

    fn seek_to_first(&mut self) {}

    fn seek_to_last(&mut self) {}

    fn seek(&mut self, _target: &[u8]) {}

    fn next(&mut self) {
        debug_assert!(false, "next() on an empty iterator");
    }

    fn prev(&mut self) {
        debug_assert!(false, "prev() on an empty iterator");
    }

    fn key(&self) -> &[u8] {
        debug_assert!(false, "key() on an empty iterator");
        &[]
    }

    fn value(&self) -> &[u8] {
        debug_assert!(false, "value() on an empty iterator");
        &[]
    }

    fn status(&self) -> Result<()> {
        self.status.clone()
    }
}

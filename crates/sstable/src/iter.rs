use common::{Iter, Result};

/// Owns a child iterator and caches its `valid`/`key` state so hot loops
/// in the merging and two-level iterators avoid repeated dynamic calls.
/// Every mutating call re-synchronizes the cache.
pub(crate) struct IterWrapper {
    iter: Option<Box<dyn Iter>>,
    valid: bool,
    key: Vec<u8>,
}

impl IterWrapper {
    pub(crate) fn new(iter: Option<Box<dyn Iter>>) -> IterWrapper {
        let mut wrapper = IterWrapper {
            iter,
            valid: false,
            key: Vec::new(),
        };
        wrapper.update();
        wrapper
    }

    /// Replaces the wrapped iterator, dropping the previous one.
    pub(crate) fn set(&mut self, iter: Option<Box<dyn Iter>>) {
        self.iter = iter;
        self.update();
    }

    pub(crate) fn is_set(&self) -> bool {
        self.iter.is_some()
    }

    pub(crate) fn valid(&self) -> bool {
        self.valid
    }

    /// Requires `valid()`.
    pub(crate) fn key(&self) -> &[u8] {
        debug_assert!(self.valid);
        &self.key
    }

    /// Requires `valid()`.
    pub(crate) fn value(&self) -> &[u8] {
        debug_assert!(self.valid);
        match &self.iter {
            Some(iter) => iter.value(),
            None => &[],
        }
    }

    pub(crate) fn status(&self) -> Result<()> {
        match &self.iter {
            Some(iter) => iter.status(),
            None => Ok(()),
        }
    }

    pub(crate) fn seek(&mut self, target: &[u8]) {
        if let Some(iter) = &mut self.iter {
            iter.seek(target);
        }
        self.update();
    }

    pub(crate) fn seek_to_first(&mut self) {
        if let Some(iter) = &mut self.iter {
            iter.seek_to_first();
        }
        self.update();
    }

    pub(crate) fn seek_to_last(&mut self) {
        if let Some(iter) = &mut self.iter {
            iter.seek_to_last();
        }
        self.update();
    }

    pub(crate) fn next(&mut self) {
        if let Some(iter) = &mut self.iter {
            iter.next();
        }
        self.update();
    }

    pub(crate) fn prev(&mut self) {
        if let Some(iter) = &mut self.iter {
            iter.prev();
        }
        self.update();
    }

    fn update(&mut self) {
        match &self.iter {
            Some(iter) if iter.valid() => {
                self.valid = true;
                self.key.clear();
                self.key.extend_from_slice(iter.key());
            }
            _ => {
                self.valid = false;
                self.key.clear();
            }
        }
    }
}

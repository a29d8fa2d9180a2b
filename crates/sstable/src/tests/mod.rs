use common::{Iter, Result};

mod filter_tests;
mod merge_tests;

/// In-memory sorted iterator over owned pairs, for driving the
/// composition iterators without any file plumbing.
pub(crate) struct VecIter {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    /// Index of the current entry; `entries.len()` means invalid.
    pos: usize,
}

impl VecIter {
    pub(crate) fn new(entries: Vec<(Vec<u8>, Vec<u8>)>) -> VecIter {
        debug_assert!(entries.windows(2).all(|w| w[0].0 <= w[1].0));
        let pos = entries.len();
        VecIter { entries, pos }
    }

    pub(crate) fn from_keys(keys: &[&str]) -> VecIter {
        VecIter::new(
            keys.iter()
                .map(|k| (k.as_bytes().to_vec(), format!("v-{k}").into_bytes()))
                .collect(),
        )
    }
}

impl Iter for VecIter {
    fn valid(&self) -> bool {
        self.pos < self.entries.len()
    }

    fn seek_to_first(&mut self) {
        self.pos = 0;
    }

    fn seek_to_last(&mut self) {
        self.pos = if self.entries.is_empty() {
            0
        } else {
            self.entries.len() - 1
        };
    }

    fn seek(&mut self, target: &[u8]) {
        self.pos = self
            .entries
            .partition_point(|(k, _)| k.as_slice() < target);
    }

    fn next(&mut self) {
        assert!(self.valid());
        self.pos += 1;
    }

    fn prev(&mut self) {
        assert!(self.valid());
        if self.pos == 0 {
            self.pos = self.entries.len();
        } else {
            self.pos -= 1;
        }
    }

    fn key(&self) -> &[u8] {
        &self.entries[self.pos].0
    }

    fn value(&self) -> &[u8] {
        &self.entries[self.pos].1
    }

    fn status(&self) -> Result<()> {
        Ok(())
    }
}

/// Drains a freshly positioned iterator forward into owned pairs.
pub(crate) fn collect_forward(iter: &mut dyn Iter) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    iter.seek_to_first();
    while iter.valid() {
        out.push((iter.key().to_vec(), iter.value().to_vec()));
        iter.next();
    }
    out
}

/// Drains an iterator backward from the end into owned pairs.
pub(crate) fn collect_backward(iter: &mut dyn Iter) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut out = Vec::new();
    iter.seek_to_last();
    while iter.valid() {
        out.push((iter.key().to_vec(), iter.value().to_vec()));
        iter.prev();
    }
    out
}

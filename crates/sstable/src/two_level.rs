//! Index-then-data iterator composition.
//!
//! The first level iterates an index whose values encode block handles;
//! the second level iterates the data block each handle addresses. Data
//! iterators are created on demand through an injected block function so
//! this layer stays ignorant of caching, filters, and file layout.

use common::{Iter, Result};

use crate::iter::IterWrapper;

/// Turns an encoded index value into an iterator over its data block.
/// Errors are surfaced through the returned iterator's status.
pub type BlockFunction = Box<dyn Fn(&[u8]) -> Box<dyn Iter>>;

pub struct TwoLevelIter {
    block_function: BlockFunction,
    index_iter: IterWrapper,
    data_iter: IterWrapper,
    /// Encoded handle of the block `data_iter` currently covers, used to
    /// skip reloading when consecutive seeks hit the same block.
    data_block_handle: Vec<u8>,
    status: Result<()>,
}

impl TwoLevelIter {
    #[must_use]
    pub fn new(index_iter: Box<dyn Iter>, block_function: BlockFunction) -> TwoLevelIter {
        TwoLevelIter {
            block_function,
            index_iter: IterWrapper::new(Some(index_iter)),
            data_iter: IterWrapper::new(None),
            data_block_handle: Vec::new(),
            status: Ok(()),
        }
    }

    fn save_error(&mut self, result: Result<()>) {
        if self.status.is_ok() {
            if let Err(e) = result {
                self.status = Err(e);
            }
        }
    }

    fn set_data_iter(&mut self, iter: Option<Box<dyn Iter>>) {
        // An error in the outgoing iterator would be lost with it; latch
        // it first.
        let outgoing = self.data_iter.status();
        self.save_error(outgoing);
        self.data_iter.set(iter);
    }

    fn init_data_block(&mut self) {
        if !self.index_iter.valid() {
            self.set_data_iter(None);
            return;
        }
        let handle = self.index_iter.value();
        if self.data_iter.is_set() && handle == self.data_block_handle.as_slice() {
            // data_iter already covers this block.
            return;
        }
        let handle = handle.to_vec();
        let iter = (self.block_function)(&handle);
        self.data_block_handle = handle;
        self.set_data_iter(Some(iter));
    }

    /// Blocks may be empty or fail to load; walk the index forward until
    /// the data iterator lands somewhere valid or the index runs out.
    fn skip_empty_data_blocks_forward(&mut self) {
        while !self.data_iter.is_set() || !self.data_iter.valid() {
            if !self.index_iter.valid() {
                self.set_data_iter(None);
                return;
            }
            self.index_iter.next();
            self.init_data_block();
            if self.data_iter.is_set() {
                self.data_iter.seek_to_first();
            }
        }
    }

    fn skip_empty_data_blocks_backward(&mut self) {
        while !self.data_iter.is_set() || !self.data_iter.valid() {
            if !self.index_iter.valid() {
                self.set_data_iter(None);
                return;
            }
            self.index_iter.prev();
            self.init_data_block();
            if self.data_iter.is_set() {
                self.data_iter.seek_to_last();
            }
        }
    }
}

impl Iter for TwoLevelIter {
    fn valid(&self) -> bool {
        self.data_iter.valid()
    }

    fn seek(&mut self, target: &[u8]) {
        self.index_iter.seek(target);
        self.init_data_block();
        if self.data_iter.is_set() {
            self.data_iter.seek(target);
        }
        self.skip_empty_data_blocks_forward();
    }

    fn seek_to_first(&mut self) {
        self.index_iter.seek_to_first();
        self.init_data_block();
        if self.data_iter.is_set() {
            self.data_iter.seek_to_first();
        }
        self.skip_empty_data_blocks_forward();
    }

    fn seek_to_last(&mut self) {
        self.index_iter.seek_to_last();
        self.init_data_block();
        if self.data_iter.is_set() {
            self.data_iter.seek_to_last();
        }
        self.skip_empty_data_blocks_backward();
    }

    fn next(&mut self) {
        debug_assert!(self.valid());
        self.data_iter.next();
        self.skip_empty_data_blocks_forward();
    }

    fn prev(&mut self) {
        debug_assert!(self.valid());
        self.data_iter.prev();
        self.skip_empty_data_blocks_backward();
    }

    fn key(&self) -> &[u8] {
        debug_assert!(self.valid());
        self.data_iter.key()
    }

    fn value(&self) -> &[u8] {
        debug_assert!(self.valid());
        self.data_iter.value()
    }

    fn status(&self) -> Result<()> {
        self.index_iter.status()?;
        self.data_iter.status()?;
        self.status.clone()
    }
}

use std::cmp::Ordering;
use std::sync::Arc;

use coding::{encode_varint32, put_fixed32};
use common::Comparator;

/// Builds the prefix-compressed block format parsed by [`crate::Block`].
///
/// Keys must be added in strictly increasing comparator order. Every
/// `block_restart_interval` entries the full key is emitted and its
/// offset recorded as a restart point; entries in between store only the
/// suffix differing from the previous key.
pub struct BlockBuilder {
    cmp: Arc<dyn Comparator>,
    block_restart_interval: usize,
    buffer: Vec<u8>,
    /// Offsets of restart-point entries within `buffer`.
    restarts: Vec<u32>,
    /// Entries emitted since the last restart point.
    counter: usize,
    finished: bool,
    last_key: Vec<u8>,
}

impl BlockBuilder {
    #[must_use]
    pub fn new(cmp: Arc<dyn Comparator>, block_restart_interval: usize) -> BlockBuilder {
        debug_assert!(block_restart_interval >= 1);
        BlockBuilder {
            cmp,
            block_restart_interval,
            buffer: Vec::new(),
            restarts: vec![0],
            counter: 0,
            finished: false,
            last_key: Vec::new(),
        }
    }

    /// Clears all state so the builder can produce another block.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.restarts.clear();
        self.restarts.push(0);
        self.counter = 0;
        self.finished = false;
        self.last_key.clear();
    }

    /// Appends an entry. `key` must compare strictly greater than every
    /// previously added key; the builder must not be finished.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        debug_assert!(!self.finished);
        debug_assert!(self.counter <= self.block_restart_interval);
        debug_assert!(
            self.buffer.is_empty() || self.cmp.compare(key, &self.last_key) == Ordering::Greater,
            "keys added out of order"
        );

        let mut shared = 0;
        if self.counter < self.block_restart_interval {
            // Length of the prefix shared with the previous key.
            let min_length = self.last_key.len().min(key.len());
            while shared < min_length && self.last_key[shared] == key[shared] {
                shared += 1;
            }
        } else {
            // Restart point: store the full key.
            self.restarts.push(self.buffer.len() as u32);
            self.counter = 0;
        }
        let non_shared = key.len() - shared;

        encode_varint32(&mut self.buffer, shared as u32);
        encode_varint32(&mut self.buffer, non_shared as u32);
        encode_varint32(&mut self.buffer, value.len() as u32);
        self.buffer.extend_from_slice(&key[shared..]);
        self.buffer.extend_from_slice(value);

        self.last_key.truncate(shared);
        self.last_key.extend_from_slice(&key[shared..]);
        debug_assert_eq!(self.last_key, key);
        self.counter += 1;
    }

    /// Appends the restart array and count, freezing the builder until
    /// the next `reset`.
    pub fn finish(&mut self) -> &[u8] {
        for &restart in &self.restarts {
            put_fixed32(&mut self.buffer, restart);
        }
        put_fixed32(&mut self.buffer, self.restarts.len() as u32);
        self.finished = true;
        &self.buffer
    }

    /// Approximate size of the block `finish` would currently produce.
    #[must_use]
    pub fn current_size_estimate(&self) -> usize {
        self.buffer.len() + self.restarts.len() * 4 + 4
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

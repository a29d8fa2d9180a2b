//! Filter block construction and lookup.
//!
//! A table carries at most one filter block holding a sequence of small
//! filters, one per 2 KiB range of data-block file offsets:
//!
//! ```text
//! filter_data*
//! filter_offset (fixed32) *    start of each filter within the block
//! array_offset (fixed32)       start of the offset array
//! base_lg (u8)                 log2 of the offset range per filter
//! ```
//!
//! Filters are advisory: a reader that finds the block malformed answers
//! "may match" so lookups fall back to the data block. False negatives
//! are never allowed.

use std::sync::Arc;

use coding::{decode_fixed32, put_fixed32};
use common::FilterPolicy;

/// Every 2 KiB of data-block offsets gets its own filter.
const FILTER_BASE_LG: u8 = 11;
const FILTER_BASE: u64 = 1 << FILTER_BASE_LG;

pub struct FilterBlockBuilder {
    policy: Arc<dyn FilterPolicy>,
    /// Flattened keys added since the last filter was generated, plus
    /// the start offset of each within the flat buffer.
    keys: Vec<u8>,
    starts: Vec<usize>,
    result: Vec<u8>,
    filter_offsets: Vec<u32>,
}

impl FilterBlockBuilder {
    #[must_use]
    pub fn new(policy: Arc<dyn FilterPolicy>) -> FilterBlockBuilder {
        FilterBlockBuilder {
            policy,
            keys: Vec::new(),
            starts: Vec::new(),
            result: Vec::new(),
            filter_offsets: Vec::new(),
        }
    }

    /// Tells the builder a data block begins at `block_offset`. Emits
    /// filters (possibly several empty ones) until the filter array
    /// covers that offset.
    pub fn start_block(&mut self, block_offset: u64) {
        let filter_index = block_offset / FILTER_BASE;
        debug_assert!(filter_index >= self.filter_offsets.len() as u64);
        while filter_index > self.filter_offsets.len() as u64 {
            self.generate_filter();
        }
    }

    /// Adds a key that will live in the current data block.
    pub fn add_key(&mut self, key: &[u8]) {
        self.starts.push(self.keys.len());
        self.keys.extend_from_slice(key);
    }

    /// Emits any pending filter plus the offset array trailer.
    pub fn finish(&mut self) -> &[u8] {
        if !self.starts.is_empty() {
            self.generate_filter();
        }

        let array_offset = self.result.len() as u32;
        let offsets = std::mem::take(&mut self.filter_offsets);
        for offset in &offsets {
            put_fixed32(&mut self.result, *offset);
        }
        self.filter_offsets = offsets;
        put_fixed32(&mut self.result, array_offset);
        self.result.push(FILTER_BASE_LG);
        &self.result
    }

    fn generate_filter(&mut self) {
        self.filter_offsets.push(self.result.len() as u32);
        if self.starts.is_empty() {
            // No keys in this range; the empty filter is recorded as a
            // zero-length span in the offset array.
            return;
        }

        self.starts.push(self.keys.len()); // Sentinel for slicing.
        let key_slices: Vec<&[u8]> = self
            .starts
            .windows(2)
            .map(|w| &self.keys[w[0]..w[1]])
            .collect();
        self.policy.create_filter(&key_slices, &mut self.result);

        self.keys.clear();
        self.starts.clear();
    }
}

pub struct FilterBlockReader {
    policy: Arc<dyn FilterPolicy>,
    data: Vec<u8>,
    /// Offset of the filter-offset array within `data`.
    array_offset: usize,
    /// Number of filters in the array.
    num: usize,
    base_lg: u8,
}

impl FilterBlockReader {
    /// Parses `contents`; a malformed block yields a reader whose
    /// `key_may_match` always answers true.
    #[must_use]
    pub fn new(policy: Arc<dyn FilterPolicy>, contents: Vec<u8>) -> FilterBlockReader {
        let mut reader = FilterBlockReader {
            policy,
            data: Vec::new(),
            array_offset: 0,
            num: 0,
            base_lg: 0,
        };

        let n = contents.len();
        if n < 5 {
            // 1 byte base_lg + 4 bytes array offset at minimum.
            return reader;
        }
        let base_lg = contents[n - 1];
        let array_offset = decode_fixed32(&contents[n - 5..]) as usize;
        if array_offset > n - 5 {
            return reader;
        }
        reader.num = (n - 5 - array_offset) / 4;
        reader.base_lg = base_lg;
        reader.array_offset = array_offset;
        reader.data = contents;
        reader
    }

    /// Whether the key may be present in the data block starting at
    /// `block_offset`. Out-of-range indexes and inconsistent offsets
    /// answer true; only a well-formed empty filter range answers false.
    #[must_use]
    pub fn key_may_match(&self, block_offset: u64, key: &[u8]) -> bool {
        let index = (block_offset >> self.base_lg) as usize;
        if index >= self.num {
            // Errors are treated as potential matches.
            return true;
        }

        let start = decode_fixed32(&self.data[self.array_offset + 4 * index..]) as usize;
        let limit = decode_fixed32(&self.data[self.array_offset + 4 * (index + 1)..]) as usize;
        if start > limit || limit > self.array_offset {
            return true;
        }
        if start == limit {
            // Empty filters hold no keys for this range.
            return false;
        }
        self.policy.key_may_match(key, &self.data[start..limit])
    }
}

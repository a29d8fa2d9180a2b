//! Prefix-compressed sorted block and its iterator.
//!
//! A block holds sorted entries followed by a restart-offset array:
//!
//! ```text
//! entry*                       shared | non_shared | value_len (varint32 each)
//!                              key_delta bytes | value bytes
//! restart_offset (fixed32) *   offsets of full-key entries
//! num_restarts (fixed32)
//! ```
//!
//! Between restarts each entry stores only the suffix that differs from
//! the previous key, so a key can never be decoded in isolation; seeks
//! binary-search the restart array for a full key and scan forward from
//! there.

use std::cmp::Ordering;
use std::sync::Arc;

use coding::decode_fixed32;
use common::{Comparator, Error, Iter, Result};

/// An immutable parsed block. Shared behind `Arc` so a block cache and
/// any number of live iterators can hold it concurrently; the last owner
/// dropping it frees the buffer.
pub struct Block {
    data: Vec<u8>,
    /// Offset of the restart array within `data`.
    restart_offset: usize,
    num_restarts: u32,
}

impl Block {
    /// Parses the trailer of `contents`. Structural problems (too short
    /// for the restart count, restart array overflowing the buffer)
    /// surface as Corruption.
    pub fn new(contents: Vec<u8>) -> Result<Block> {
        let n = contents.len();
        if n < 4 {
            return Err(Error::Corruption("bad block contents".to_string()));
        }
        let num_restarts = decode_fixed32(&contents[n - 4..]);
        let max_restarts = ((n - 4) / 4) as u32;
        if num_restarts > max_restarts {
            return Err(Error::Corruption("bad block contents".to_string()));
        }
        let restart_offset = n - 4 - 4 * num_restarts as usize;
        Ok(Block {
            data: contents,
            restart_offset,
            num_restarts,
        })
    }

    /// Bytes held by this block, used as the cache charge.
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn restart_point(&self, index: u32) -> u32 {
        debug_assert!(index < self.num_restarts);
        decode_fixed32(&self.data[self.restart_offset + 4 * index as usize..])
    }
}

/// Decoded per-entry header.
struct EntryHeader {
    shared: u32,
    non_shared: u32,
    value_len: u32,
    /// Bytes consumed by the three varints.
    header_len: usize,
}

/// Decodes the entry header starting at `data[offset]`, bounded by
/// `limit`. `None` means the entry overruns the block: corruption.
fn decode_entry(data: &[u8], offset: usize, limit: usize) -> Option<EntryHeader> {
    if limit < offset + 3 {
        return None;
    }
    let buf = &data[offset..limit];

    let (shared, non_shared, value_len, header_len);
    if (buf[0] | buf[1] | buf[2]) < 0x80 {
        // Fast path: all three lengths are single-byte varints, stored
        // consecutively.
        shared = u32::from(buf[0]);
        non_shared = u32::from(buf[1]);
        value_len = u32::from(buf[2]);
        header_len = 3;
    } else {
        let mut cursor = buf;
        shared = coding::get_varint32(&mut cursor)?;
        non_shared = coding::get_varint32(&mut cursor)?;
        value_len = coding::get_varint32(&mut cursor)?;
        header_len = buf.len() - cursor.len();
    }

    if ((limit - offset - header_len) as u64) < u64::from(non_shared) + u64::from(value_len) {
        return None;
    }
    Some(EntryHeader {
        shared,
        non_shared,
        value_len,
        header_len,
    })
}

pub struct BlockIter {
    block: Arc<Block>,
    cmp: Arc<dyn Comparator>,
    /// Offset of the current entry within the block, or `restart_offset`
    /// when invalid.
    current: usize,
    /// Index of the restart block in which `current` falls.
    restart_index: u32,
    /// Reconstructed full key of the current entry.
    key: Vec<u8>,
    /// Current entry's value range within the block data.
    value_start: usize,
    value_len: usize,
    status: Result<()>,
}

impl BlockIter {
    /// The iterator keeps the block alive through its `Arc`, which is
    /// what ties a cached block's lifetime to the iterators reading it.
    #[must_use]
    pub fn new(block: Arc<Block>, cmp: Arc<dyn Comparator>) -> BlockIter {
        let restart_offset = block.restart_offset;
        let num_restarts = block.num_restarts;
        BlockIter {
            block,
            cmp,
            current: restart_offset,
            restart_index: num_restarts,
            key: Vec::new(),
            value_start: 0,
            value_len: 0,
            status: Ok(()),
        }
    }

    /// Offset just past the current entry, where the next one begins.
    fn next_entry_offset(&self) -> usize {
        self.value_start + self.value_len
    }

    fn seek_to_restart_point(&mut self, index: u32) {
        self.key.clear();
        self.restart_index = index;
        // No length yet; parse_next_key picks up from here.
        self.value_start = self.block.restart_point(index) as usize;
        self.value_len = 0;
    }

    fn mark_invalid(&mut self) {
        self.current = self.block.restart_offset;
        self.restart_index = self.block.num_restarts;
        self.key.clear();
        self.value_start = 0;
        self.value_len = 0;
    }

    fn corruption_error(&mut self) {
        self.mark_invalid();
        if self.status.is_ok() {
            self.status = Err(Error::Corruption("bad entry in block".to_string()));
        }
    }

    /// Decodes the entry at `next_entry_offset`, extending the running
    /// key by its delta. Returns false at end of block or on corruption.
    fn parse_next_key(&mut self) -> bool {
        self.current = self.next_entry_offset();
        if self.current >= self.block.restart_offset {
            // No more entries; mark invalid without an error.
            self.current = self.block.restart_offset;
            self.restart_index = self.block.num_restarts;
            return false;
        }

        let header = match decode_entry(&self.block.data, self.current, self.block.restart_offset)
        {
            Some(h) => h,
            None => {
                self.corruption_error();
                return false;
            }
        };
        if self.key.len() < header.shared as usize {
            self.corruption_error();
            return false;
        }

        let delta_start = self.current + header.header_len;
        self.key.truncate(header.shared as usize);
        self.key.extend_from_slice(
            &self.block.data[delta_start..delta_start + header.non_shared as usize],
        );
        self.value_start = delta_start + header.non_shared as usize;
        self.value_len = header.value_len as usize;

        while self.restart_index + 1 < self.block.num_restarts
            && (self.block.restart_point(self.restart_index + 1) as usize) < self.current
        {
            self.restart_index += 1;
        }
        true
    }
}

impl Iter for BlockIter {
    fn valid(&self) -> bool {
        self.current < self.block.restart_offset
    }

    fn seek_to_first(&mut self) {
        if self.block.num_restarts == 0 {
            // Zero restart points means zero entries, not corruption.
            self.mark_invalid();
            return;
        }
        self.seek_to_restart_point(0);
        self.parse_next_key();
    }

    fn seek_to_last(&mut self) {
        if self.block.num_restarts == 0 {
            self.mark_invalid();
            return;
        }
        self.seek_to_restart_point(self.block.num_restarts - 1);
        while self.parse_next_key() && self.next_entry_offset() < self.block.restart_offset {
            // Keep walking to the last entry.
        }
    }

    fn seek(&mut self, target: &[u8]) {
        if self.block.num_restarts == 0 {
            self.mark_invalid();
            return;
        }
        // Binary search the restart array for the last restart point
        // whose key is < target.
        let mut left: u32 = 0;
        let mut right: u32 = self.block.num_restarts - 1;
        while left < right {
            let mid = (left + right + 1) / 2;
            let region_offset = self.block.restart_point(mid) as usize;
            let header =
                match decode_entry(&self.block.data, region_offset, self.block.restart_offset) {
                    Some(h) if h.shared == 0 => h,
                    // A restart point with a shared prefix, or one that
                    // does not decode, is structural corruption.
                    _ => {
                        self.corruption_error();
                        return;
                    }
                };
            let key_start = region_offset + header.header_len;
            let mid_key = &self.block.data[key_start..key_start + header.non_shared as usize];
            if self.cmp.compare(mid_key, target) == Ordering::Less {
                left = mid;
            } else {
                right = mid - 1;
            }
        }

        // Linear scan within the restart block for the first key >= target.
        self.seek_to_restart_point(left);
        loop {
            if !self.parse_next_key() {
                return;
            }
            if self.cmp.compare(&self.key, target) != Ordering::Less {
                return;
            }
        }
    }

    fn next(&mut self) {
        debug_assert!(self.valid());
        self.parse_next_key();
    }

    fn prev(&mut self) {
        debug_assert!(self.valid());

        // Find the restart point that strictly precedes the current
        // entry, then scan forward from it until just before current.
        let original = self.current;
        while self.block.restart_point(self.restart_index) as usize >= original {
            if self.restart_index == 0 {
                // No entry before the first one.
                self.current = self.block.restart_offset;
                self.restart_index = self.block.num_restarts;
                return;
            }
            self.restart_index -= 1;
        }

        self.seek_to_restart_point(self.restart_index);
        while self.parse_next_key() && self.next_entry_offset() < original {
            // Advance until the entry right before `original`.
        }
    }

    fn key(&self) -> &[u8] {
        debug_assert!(self.valid());
        &self.key
    }

    fn value(&self) -> &[u8] {
        debug_assert!(self.valid());
        &self.block.data[self.value_start..self.value_start + self.value_len]
    }

    fn status(&self) -> Result<()> {
        self.status.clone()
    }
}

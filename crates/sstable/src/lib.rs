//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk storage files for the StratumKV storage core.
//!
//! When the in-memory memtable exceeds its size threshold the engine
//! flushes it to disk as an SSTable. SSTables are *write-once,
//! read-many* — once created they are never modified (only replaced
//! during compaction).
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA BLOCKS (prefix-compressed sorted entries)                │
//! │                                                               │
//! │ each block:                                                   │
//! │   shared (varint32) | non_shared (varint32)                   │
//! │   value_len (varint32) | key_delta | value    ... repeated    │
//! │   restart_offset (fixed32) * | num_restarts (fixed32)         │
//! │ followed on disk by: type (u8) | crc32 (fixed32)              │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FILTER BLOCK (optional, raw)                                  │
//! │                                                               │
//! │ filter_data * | filter_offset (fixed32) *                     │
//! │ array_offset (fixed32) | base_lg (u8)                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │ METAINDEX BLOCK ("filter.<policy>" -> filter BlockHandle)     │
//! ├───────────────────────────────────────────────────────────────┤
//! │ INDEX BLOCK (last-key-in-block -> data BlockHandle)           │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 48 bytes)                                 │
//! │                                                               │
//! │ metaindex handle | index handle | padding | magic (fixed64)   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian; handles are varint64 pairs. The magic
//! constant `0xdb4775248b80fb57` identifies the format. The trailing
//! `type` byte of each block is a compression code; only uncompressed
//! blocks are supported, and a checksum-verification request or foreign
//! compression code is reported as NotSupported rather than guessed at.
//!
//! ## Reading path
//!
//! [`Table::open`] parses the footer and index block eagerly; data
//! blocks are loaded lazily per lookup or scan, through the optional
//! shared [`LruBlockCache`]. Iterators hold their block via `Arc`, so a
//! cached block evicted mid-scan stays alive until the scan moves on.

mod block;
mod block_builder;
mod cache;
mod file;
mod filter_block;
mod format;
mod iter;
mod merge;
mod options;
mod table;
mod table_builder;
mod two_level;

pub use block::{Block, BlockIter};
pub use block_builder::BlockBuilder;
pub use cache::{BlockCache, LruBlockCache};
pub use file::{FsRandomAccessFile, MemFile, RandomAccessFile};
pub use filter_block::{FilterBlockBuilder, FilterBlockReader};
pub use format::{read_block, BlockHandle, Footer, BLOCK_TRAILER_SIZE, TABLE_MAGIC};
pub use merge::MergingIter;
pub use options::{CompressionType, Options, ReadOptions};
pub use table::Table;
pub use table_builder::TableBuilder;
pub use two_level::{BlockFunction, TwoLevelIter};

#[cfg(test)]
mod tests;

use std::sync::Arc;

use common::{BytewiseComparator, Comparator, FilterPolicy, SequenceNumber};

use crate::cache::BlockCache;

/// Block compression codes as stored in the on-disk block trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    NoCompression = 0,
}

impl CompressionType {
    #[must_use]
    pub fn from_u8(v: u8) -> Option<CompressionType> {
        match v {
            0 => Some(CompressionType::NoCompression),
            _ => None,
        }
    }
}

/// Construction-time and open-time knobs for tables and blocks.
///
/// Cloning is cheap; the heavyweight members are shared behind `Arc`.
#[derive(Clone)]
pub struct Options {
    /// Ordering for keys in blocks and tables. Table files written with
    /// one comparator must never be read with another.
    pub comparator: Arc<dyn Comparator>,

    /// Uncompressed data-block payload size a builder aims for before
    /// cutting a block.
    pub block_size: usize,

    /// Entries between restart points inside a block. Must be >= 1.
    pub block_restart_interval: usize,

    /// Optional per-table filter, consulted on point lookups to skip
    /// block reads for absent keys.
    pub filter_policy: Option<Arc<dyn FilterPolicy>>,

    /// Optional shared cache of decoded data blocks.
    pub block_cache: Option<Arc<dyn BlockCache>>,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            comparator: Arc::new(BytewiseComparator),
            block_size: 4096,
            block_restart_interval: 16,
            filter_policy: None,
            block_cache: None,
        }
    }
}

/// Per-read knobs.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// Request checksum verification of block reads. Verification is not
    /// implemented; setting this surfaces NotSupported at the first block
    /// read instead of silently skipping the check.
    pub verify_checksums: bool,

    /// Whether blocks read on behalf of this operation should populate
    /// the block cache. Bulk scans typically turn this off.
    pub fill_cache: bool,

    /// Sequence number bounding what this read may observe. Tables store
    /// whatever they were built with; the lookup layer applies this when
    /// it forms internal seek keys.
    pub snapshot: Option<SequenceNumber>,
}

impl Default for ReadOptions {
    fn default() -> ReadOptions {
        ReadOptions {
            verify_checksums: false,
            fill_cache: true,
            snapshot: None,
        }
    }
}

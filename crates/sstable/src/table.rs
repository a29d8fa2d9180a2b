use std::sync::Arc;

use coding::put_fixed64;
use common::{BytewiseComparator, EmptyIter, Error, Iter, Result};

use crate::block::{Block, BlockIter};
use crate::file::RandomAccessFile;
use crate::filter_block::FilterBlockReader;
use crate::format::{read_block, BlockHandle, Footer};
use crate::options::{Options, ReadOptions};
use crate::two_level::TwoLevelIter;

/// Everything needed to turn a block handle into an open block: shared
/// by the table itself and by the closures its iterators carry.
#[derive(Clone)]
struct BlockFetcher {
    options: Options,
    file: Arc<dyn RandomAccessFile>,
    /// Namespace for this table's entries in the shared block cache.
    cache_id: u64,
}

impl BlockFetcher {
    /// Loads the data block at `handle`, via the shared cache when one
    /// is configured. The returned `Arc` keeps the block alive for as
    /// long as any caller (or the cache) holds it.
    fn read_data_block(&self, options: &ReadOptions, handle: &BlockHandle) -> Result<Arc<Block>> {
        let cache = match &self.options.block_cache {
            Some(cache) => cache,
            None => {
                let contents = read_block(self.file.as_ref(), options, handle)?;
                return Ok(Arc::new(Block::new(contents)?));
            }
        };

        let mut cache_key = Vec::with_capacity(16);
        put_fixed64(&mut cache_key, self.cache_id);
        put_fixed64(&mut cache_key, handle.offset());
        if let Some(block) = cache.lookup(&cache_key) {
            return Ok(block);
        }

        let contents = read_block(self.file.as_ref(), options, handle)?;
        let block = Arc::new(Block::new(contents)?);
        if options.fill_cache {
            cache.insert(cache_key, Arc::clone(&block), block.size());
        }
        Ok(block)
    }

    /// Iterator factory handed to the two-level iterator: decodes an
    /// index value into a handle and opens that block. Failures come
    /// back as an empty iterator carrying the error.
    fn block_reader(&self, options: &ReadOptions, index_value: &[u8]) -> Box<dyn Iter> {
        let mut input = index_value;
        let handle = match BlockHandle::decode_from(&mut input) {
            Ok(handle) => handle,
            Err(e) => return Box::new(EmptyIter::with_status(e)),
        };
        match self.read_data_block(options, &handle) {
            Ok(block) => Box::new(BlockIter::new(
                block,
                Arc::clone(&self.options.comparator),
            )),
            Err(e) => Box::new(EmptyIter::with_status(e)),
        }
    }
}

/// An open, immutable table file: parsed footer and index block plus an
/// optional filter, queryable for point lookups and ordered scans.
///
/// Safe for unbounded concurrent readers; all state after `open` is
/// immutable.
pub struct Table {
    fetcher: BlockFetcher,
    metaindex_handle: BlockHandle,
    index_block: Arc<Block>,
    filter: Option<FilterBlockReader>,
}

impl Table {
    /// Opens the table persisted in the first `size` bytes of `file`.
    ///
    /// The footer and index block are read eagerly and a bad magic
    /// number or truncated file fails the open. The metaindex and filter
    /// block are best-effort: a table whose filter cannot be read is
    /// served without one.
    pub fn open(options: Options, file: Arc<dyn RandomAccessFile>, size: u64) -> Result<Table> {
        if size < Footer::ENCODED_LENGTH as u64 {
            return Err(Error::InvalidArgument(
                "file is too short to be an sstable".to_string(),
            ));
        }
        let footer_input = file.read(
            size - Footer::ENCODED_LENGTH as u64,
            Footer::ENCODED_LENGTH,
        )?;
        let footer = Footer::decode_from(&footer_input)?;

        let index_contents =
            read_block(file.as_ref(), &ReadOptions::default(), &footer.index_handle)?;
        let index_block = Arc::new(Block::new(index_contents)?);

        let cache_id = match &options.block_cache {
            Some(cache) => cache.new_id(),
            None => 0,
        };

        let mut table = Table {
            fetcher: BlockFetcher {
                options,
                file,
                cache_id,
            },
            metaindex_handle: footer.metaindex_handle,
            index_block,
            filter: None,
        };
        table.read_meta();
        Ok(table)
    }

    /// Best-effort load of the filter block via the metaindex. Any
    /// failure leaves the table filterless.
    fn read_meta(&mut self) {
        let policy = match &self.fetcher.options.filter_policy {
            Some(policy) => Arc::clone(policy),
            None => return,
        };

        let contents = match read_block(
            self.fetcher.file.as_ref(),
            &ReadOptions::default(),
            &self.metaindex_handle,
        ) {
            Ok(contents) => contents,
            Err(_) => return,
        };
        let meta = match Block::new(contents) {
            Ok(block) => Arc::new(block),
            Err(_) => return,
        };

        // Metaindex keys are plain strings; always use byte order here,
        // whatever the table comparator is.
        let key = format!("filter.{}", policy.name());
        let mut iter = BlockIter::new(meta, Arc::new(BytewiseComparator));
        iter.seek(key.as_bytes());
        if iter.valid() && iter.key() == key.as_bytes() {
            let mut value = iter.value();
            if let Ok(handle) = BlockHandle::decode_from(&mut value) {
                if let Ok(filter_contents) = read_block(
                    self.fetcher.file.as_ref(),
                    &ReadOptions::default(),
                    &handle,
                ) {
                    self.filter = Some(FilterBlockReader::new(policy, filter_contents));
                }
            }
        }
    }

    fn index_iter(&self) -> BlockIter {
        BlockIter::new(
            Arc::clone(&self.index_block),
            Arc::clone(&self.fetcher.options.comparator),
        )
    }

    /// Ordered scan over every entry in the table.
    #[must_use]
    pub fn iter(&self, options: ReadOptions) -> TwoLevelIter {
        let fetcher = self.fetcher.clone();
        TwoLevelIter::new(
            Box::new(self.index_iter()),
            Box::new(move |index_value| fetcher.block_reader(&options, index_value)),
        )
    }

    /// Point lookup. Seeks the index, consults the filter (a negative
    /// answer skips the block read entirely), then seeks the data block;
    /// `found` is invoked with the entry the seek lands on, if any.
    pub fn internal_get(
        &self,
        options: &ReadOptions,
        key: &[u8],
        found: &mut dyn FnMut(&[u8], &[u8]),
    ) -> Result<()> {
        let mut index_iter = self.index_iter();
        index_iter.seek(key);
        if index_iter.valid() {
            let mut input = index_iter.value();
            let handle = BlockHandle::decode_from(&mut input)?;
            let matches = match &self.filter {
                Some(filter) => filter.key_may_match(handle.offset(), key),
                None => true,
            };
            if matches {
                let block = self.fetcher.read_data_block(options, &handle)?;
                let mut block_iter =
                    BlockIter::new(block, Arc::clone(&self.fetcher.options.comparator));
                block_iter.seek(key);
                if block_iter.valid() {
                    found(block_iter.key(), block_iter.value());
                }
                block_iter.status()?;
            }
        }
        index_iter.status()
    }

    /// File offset at which the block containing `key` begins, or the
    /// metaindex offset (roughly end-of-data) for keys past the table.
    #[must_use]
    pub fn approximate_offset_of(&self, key: &[u8]) -> u64 {
        let mut index_iter = self.index_iter();
        index_iter.seek(key);
        if index_iter.valid() {
            let mut input = index_iter.value();
            if let Ok(handle) = BlockHandle::decode_from(&mut input) {
                return handle.offset();
            }
            // Malformed index value; fall through to the approximation.
        }
        self.metaindex_handle.offset()
    }
}

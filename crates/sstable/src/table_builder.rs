use std::cmp::Ordering;
use std::io::Write;
use std::sync::Arc;

use common::Result;

use crate::block_builder::BlockBuilder;
use crate::filter_block::FilterBlockBuilder;
use crate::format::{BlockHandle, Footer, BLOCK_TRAILER_SIZE};
use crate::options::{CompressionType, Options};

/// Builds a table file: data blocks as they fill, then the filter block,
/// metaindex, index, and footer on [`finish`](TableBuilder::finish).
///
/// Keys must arrive in strictly increasing comparator order. The builder
/// tracks the write offset itself, so `writer` must start at offset 0 of
/// the destination file and must not be written by anyone else.
pub struct TableBuilder<W: Write> {
    options: Options,
    writer: W,
    offset: u64,
    data_block: BlockBuilder,
    index_block: BlockBuilder,
    filter_block: Option<FilterBlockBuilder>,
    last_key: Vec<u8>,
    num_entries: u64,
    closed: bool,
    /// A data block has been flushed but its index entry is still
    /// pending, waiting for the next key to compute a short separator.
    pending_index_entry: bool,
    pending_handle: BlockHandle,
}

impl<W: Write> TableBuilder<W> {
    #[must_use]
    pub fn new(options: Options, writer: W) -> TableBuilder<W> {
        let mut filter_block = options
            .filter_policy
            .as_ref()
            .map(|policy| FilterBlockBuilder::new(Arc::clone(policy)));
        if let Some(fb) = &mut filter_block {
            fb.start_block(0);
        }
        // Index entries are sparse; one restart per entry keeps index
        // seeks cheap.
        let index_block = BlockBuilder::new(Arc::clone(&options.comparator), 1);
        let data_block =
            BlockBuilder::new(Arc::clone(&options.comparator), options.block_restart_interval);
        TableBuilder {
            options,
            writer,
            offset: 0,
            data_block,
            index_block,
            filter_block,
            last_key: Vec::new(),
            num_entries: 0,
            closed: false,
            pending_index_entry: false,
            pending_handle: BlockHandle::default(),
        }
    }

    /// Appends an entry. `key` must compare strictly greater than every
    /// previously added key.
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        debug_assert!(!self.closed);
        debug_assert!(
            self.num_entries == 0
                || self.options.comparator.compare(key, &self.last_key) == Ordering::Greater,
            "keys added out of order"
        );

        if self.pending_index_entry {
            debug_assert!(self.data_block.is_empty());
            // The separator only needs to sort >= every key in the
            // flushed block and < the incoming key.
            self.options
                .comparator
                .find_shortest_separator(&mut self.last_key, key);
            let mut handle_encoding = Vec::new();
            self.pending_handle.encode_to(&mut handle_encoding);
            self.index_block.add(&self.last_key, &handle_encoding);
            self.pending_index_entry = false;
        }

        if let Some(fb) = &mut self.filter_block {
            fb.add_key(key);
        }

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.num_entries += 1;
        self.data_block.add(key, value);

        if self.data_block.current_size_estimate() >= self.options.block_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Forces the current data block out to the writer. Advanced use;
    /// `add` flushes automatically on the block-size threshold.
    pub fn flush(&mut self) -> Result<()> {
        debug_assert!(!self.closed);
        if self.data_block.is_empty() {
            return Ok(());
        }
        debug_assert!(!self.pending_index_entry);

        self.pending_handle = self.write_block_from(BlockSource::Data)?;
        self.pending_index_entry = true;
        self.writer.flush()?;
        if let Some(fb) = &mut self.filter_block {
            fb.start_block(self.offset);
        }
        Ok(())
    }

    /// Writes all trailing metadata and the footer. No further entries
    /// may be added afterwards.
    pub fn finish(&mut self) -> Result<()> {
        self.flush()?;
        debug_assert!(!self.closed);
        self.closed = true;

        // Filter block (raw, not prefix-compressed).
        let filter_handle = match &mut self.filter_block {
            Some(fb) => {
                let contents = fb.finish().to_vec();
                Some(self.write_raw_block(&contents)?)
            }
            None => None,
        };

        // Metaindex block mapping "filter.<policy>" to the filter handle.
        let metaindex_handle = {
            let mut metaindex =
                BlockBuilder::new(Arc::clone(&self.options.comparator), 1);
            if let (Some(handle), Some(policy)) = (filter_handle, &self.options.filter_policy) {
                let key = format!("filter.{}", policy.name());
                let mut handle_encoding = Vec::new();
                handle.encode_to(&mut handle_encoding);
                metaindex.add(key.as_bytes(), &handle_encoding);
            }
            let contents = metaindex.finish().to_vec();
            self.write_raw_block(&contents)?
        };

        // Index block; the final block's entry is still pending.
        if self.pending_index_entry {
            self.options
                .comparator
                .find_short_successor(&mut self.last_key);
            let mut handle_encoding = Vec::new();
            self.pending_handle.encode_to(&mut handle_encoding);
            self.index_block.add(&self.last_key, &handle_encoding);
            self.pending_index_entry = false;
        }
        let index_handle = self.write_block_from(BlockSource::Index)?;

        let footer = Footer {
            metaindex_handle,
            index_handle,
        };
        let mut footer_encoding = Vec::new();
        footer.encode_to(&mut footer_encoding);
        self.writer.write_all(&footer_encoding)?;
        self.offset += footer_encoding.len() as u64;
        self.writer.flush()?;
        Ok(())
    }

    /// Entries added so far.
    #[must_use]
    pub fn num_entries(&self) -> u64 {
        self.num_entries
    }

    /// Bytes written so far; after `finish`, the final file size.
    #[must_use]
    pub fn file_size(&self) -> u64 {
        self.offset
    }

    fn write_block_from(&mut self, source: BlockSource) -> Result<BlockHandle> {
        let contents = match source {
            BlockSource::Data => self.data_block.finish().to_vec(),
            BlockSource::Index => self.index_block.finish().to_vec(),
        };
        let handle = self.write_raw_block(&contents)?;
        match source {
            BlockSource::Data => self.data_block.reset(),
            BlockSource::Index => self.index_block.reset(),
        }
        Ok(handle)
    }

    /// Writes `contents` followed by the `type | crc` trailer.
    fn write_raw_block(&mut self, contents: &[u8]) -> Result<BlockHandle> {
        let handle = BlockHandle::new(self.offset, contents.len() as u64);
        self.writer.write_all(contents)?;

        let compression = CompressionType::NoCompression as u8;
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(contents);
        hasher.update(&[compression]);
        let crc = hasher.finalize();

        let mut trailer = Vec::with_capacity(BLOCK_TRAILER_SIZE);
        trailer.push(compression);
        coding::put_fixed32(&mut trailer, crc);
        self.writer.write_all(&trailer)?;

        self.offset += contents.len() as u64 + BLOCK_TRAILER_SIZE as u64;
        Ok(handle)
    }
}

enum BlockSource {
    Data,
    Index,
}

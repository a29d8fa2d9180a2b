//! On-disk pointers and framing: block handles, the table footer, and
//! the raw block read path.

use coding::{decode_fixed32, get_varint64, put_fixed32, varint_length};

use crate::file::RandomAccessFile;
use crate::options::{CompressionType, ReadOptions};
use common::{Error, Result};

/// Identifies a table file. Picked from random bytes once, never changed.
pub const TABLE_MAGIC: u64 = 0xdb47_7524_8b80_fb57;

/// Every stored block is followed by `type:u8 | crc:fixed32`.
pub const BLOCK_TRAILER_SIZE: usize = 5;

/// Pointer to an extent of a table file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockHandle {
    offset: u64,
    size: u64,
}

impl BlockHandle {
    /// Largest encoding: two maximal varint64s.
    pub const MAX_ENCODED_LENGTH: usize = 10 + 10;

    #[must_use]
    pub fn new(offset: u64, size: u64) -> BlockHandle {
        BlockHandle { offset, size }
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        coding::encode_varint64(dst, self.offset);
        coding::encode_varint64(dst, self.size);
    }

    /// Decodes a handle from the front of `input`, advancing it past the
    /// consumed bytes.
    pub fn decode_from(input: &mut &[u8]) -> Result<BlockHandle> {
        let offset = get_varint64(input)
            .ok_or_else(|| Error::Corruption("bad block handle".to_string()))?;
        let size = get_varint64(input)
            .ok_or_else(|| Error::Corruption("bad block handle".to_string()))?;
        Ok(BlockHandle { offset, size })
    }

    #[must_use]
    pub fn encoded_length(&self) -> usize {
        varint_length(self.offset) + varint_length(self.size)
    }
}

/// Fixed-size trailer at the end of every table file: handles for the
/// metaindex and index blocks, zero padding, then the magic number.
#[derive(Debug, Clone, Copy, Default)]
pub struct Footer {
    pub metaindex_handle: BlockHandle,
    pub index_handle: BlockHandle,
}

impl Footer {
    /// Two maximally-encoded handles plus the 8-byte magic. The encoding
    /// always occupies exactly this many bytes.
    pub const ENCODED_LENGTH: usize = 2 * BlockHandle::MAX_ENCODED_LENGTH + 8;

    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        let original_size = dst.len();
        self.metaindex_handle.encode_to(dst);
        self.index_handle.encode_to(dst);
        dst.resize(original_size + 2 * BlockHandle::MAX_ENCODED_LENGTH, 0);
        put_fixed32(dst, (TABLE_MAGIC & 0xffff_ffff) as u32);
        put_fixed32(dst, (TABLE_MAGIC >> 32) as u32);
        debug_assert_eq!(dst.len(), original_size + Footer::ENCODED_LENGTH);
    }

    pub fn decode_from(input: &[u8]) -> Result<Footer> {
        if input.len() < Footer::ENCODED_LENGTH {
            return Err(Error::InvalidArgument(
                "file is too short to be an sstable".to_string(),
            ));
        }
        let magic_offset = Footer::ENCODED_LENGTH - 8;
        let magic_lo = u64::from(decode_fixed32(&input[magic_offset..]));
        let magic_hi = u64::from(decode_fixed32(&input[magic_offset + 4..]));
        if (magic_hi << 32) | magic_lo != TABLE_MAGIC {
            return Err(Error::InvalidArgument(
                "not an sstable (bad magic number)".to_string(),
            ));
        }

        let mut cursor = input;
        let metaindex_handle = BlockHandle::decode_from(&mut cursor)?;
        let index_handle = BlockHandle::decode_from(&mut cursor)?;
        Ok(Footer {
            metaindex_handle,
            index_handle,
        })
    }
}

/// Reads the block addressed by `handle` and strips the trailer.
///
/// Checksum verification is not implemented; requesting it is reported
/// here, at the point of first use, as NotSupported. Likewise any
/// compression type other than [`CompressionType::NoCompression`].
pub fn read_block(
    file: &dyn RandomAccessFile,
    options: &ReadOptions,
    handle: &BlockHandle,
) -> Result<Vec<u8>> {
    let n = handle.size() as usize;
    let mut buf = file.read(handle.offset(), n + BLOCK_TRAILER_SIZE)?;
    if buf.len() != n + BLOCK_TRAILER_SIZE {
        return Err(Error::Corruption("truncated block read".to_string()));
    }

    if options.verify_checksums {
        return Err(Error::NotSupported(
            "block checksum verification is not implemented".to_string(),
        ));
    }

    match CompressionType::from_u8(buf[n]) {
        Some(CompressionType::NoCompression) => {
            buf.truncate(n);
            Ok(buf)
        }
        None => Err(Error::NotSupported(format!(
            "unsupported block compression type: {}",
            buf[n]
        ))),
    }
}

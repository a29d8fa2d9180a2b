use coding::{encode_varint32, put_fixed64};

/// Monotonic sequence number identifying a write; 56 usable bits.
pub type SequenceNumber = u64;

/// Largest representable sequence number. The low 8 bits of the packed
/// tag hold the operation type, leaving 56 for the sequence.
pub const MAX_SEQUENCE_NUMBER: SequenceNumber = (1 << 56) - 1;

/// Operation tag stored in the low byte of an internal key's trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ValueType {
    /// Tombstone: the key was deleted at this sequence number.
    Deletion = 0,
    /// Regular value write.
    Value = 1,
}

/// The type used when constructing a key for seeking to a particular
/// sequence number. Internal keys with the same user key sort by
/// decreasing tag, so the seek sentinel must be the highest-numbered
/// type, not the lowest.
pub const TYPE_FOR_SEEK: ValueType = ValueType::Value;

impl ValueType {
    /// Decodes the low byte of a tag. `None` for unknown type codes
    /// (corrupt data).
    #[must_use]
    pub fn from_u8(v: u8) -> Option<ValueType> {
        match v {
            0 => Some(ValueType::Deletion),
            1 => Some(ValueType::Value),
            _ => None,
        }
    }
}

/// Packs a sequence number and operation type into the 8-byte trailer.
///
/// # Panics
///
/// Panics in debug builds if `seq` exceeds [`MAX_SEQUENCE_NUMBER`].
#[must_use]
pub fn pack_sequence_and_type(seq: SequenceNumber, t: ValueType) -> u64 {
    debug_assert!(seq <= MAX_SEQUENCE_NUMBER);
    debug_assert!(t <= TYPE_FOR_SEEK);
    (seq << 8) | u64::from(t as u8)
}

/// Appends the internal-key form `user_key | fixed64(tag)` to `dst`.
pub fn append_internal_key(dst: &mut Vec<u8>, user_key: &[u8], seq: SequenceNumber, t: ValueType) {
    dst.extend_from_slice(user_key);
    put_fixed64(dst, pack_sequence_and_type(seq, t));
}

/// Returns the user-key portion of an internal key (everything except
/// the trailing 8-byte tag).
///
/// # Panics
///
/// Panics in debug builds if `internal_key` is shorter than 8 bytes.
#[must_use]
pub fn extract_user_key(internal_key: &[u8]) -> &[u8] {
    debug_assert!(internal_key.len() >= 8);
    &internal_key[..internal_key.len() - 8]
}

/// A user key plus snapshot sequence, encoded once and viewed three ways.
///
/// The single backing buffer holds:
///
/// ```text
/// varint32(klength)          <- memtable_key starts here
/// user_key bytes             <- internal_key / user_key start here
/// fixed64(tag)
/// ```
///
/// so the memtable key, the internal key, and the bare user key are all
/// subslices of one allocation.
pub struct LookupKey {
    buf: Vec<u8>,
    // Offset of the user key within buf (just past the varint prefix).
    kstart: usize,
}

impl LookupKey {
    /// Builds a lookup key for `user_key` as of snapshot `sequence`.
    ///
    /// The tag uses [`TYPE_FOR_SEEK`] so a seek lands at-or-before the
    /// first entry with sequence <= `sequence` for this user key.
    #[must_use]
    pub fn new(user_key: &[u8], sequence: SequenceNumber) -> LookupKey {
        let klen = user_key.len();
        // varint prefix (<= 5) + user key + 8-byte tag.
        let mut buf = Vec::with_capacity(klen + 13);
        encode_varint32(&mut buf, (klen + 8) as u32);
        let kstart = buf.len();
        buf.extend_from_slice(user_key);
        put_fixed64(&mut buf, pack_sequence_and_type(sequence, TYPE_FOR_SEEK));
        LookupKey { buf, kstart }
    }

    /// The full length-prefixed form, suitable for seeking a memtable.
    #[must_use]
    pub fn memtable_key(&self) -> &[u8] {
        &self.buf
    }

    /// The internal key alone, suitable for internal iterators and tables.
    #[must_use]
    pub fn internal_key(&self) -> &[u8] {
        &self.buf[self.kstart..]
    }

    /// The bare user key.
    #[must_use]
    pub fn user_key(&self) -> &[u8] {
        &self.buf[self.kstart..self.buf.len() - 8]
    }
}

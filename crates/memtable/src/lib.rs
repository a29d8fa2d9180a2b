//! # In-memory write buffer
//!
//! A `MemTable` accumulates recent writes in a sorted, concurrently
//! readable structure until the engine flushes it to an sstable. Entries
//! are internal keys (user key plus an 8-byte sequence/type tag), so a
//! single user key can hold multiple versions and tombstones at once.
//!
//! ## Entry encoding
//!
//! Each skip-list entry is one self-contained record:
//!
//! ```text
//! varint32(klength)   klength = user_key.len() + 8
//! user_key bytes
//! fixed64(tag)        (sequence << 8) | value_type
//! varint32(vlength)
//! value bytes
//! ```
//!
//! ## Thread safety
//!
//! `add` requires external synchronization (one writer at a time); `get`
//! and iterators may run concurrently with the writer and each other.
//! Callers share the table behind an `Arc` and it stays alive as long as
//! any reader holds a clone.

mod skiplist;

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use coding::{decode_fixed64, encode_varint32, get_length_prefixed_slice, get_varint32, put_fixed64};
use common::{
    pack_sequence_and_type, Comparator, Error, InternalKeyComparator, Iter, LookupKey, Result,
    SequenceNumber, ValueType,
};

use crate::skiplist::{KeyComparator, SkipList, SkipListIter};

/// Orders raw memtable entries by their internal-key portion.
struct EntryComparator {
    cmp: InternalKeyComparator,
}

impl KeyComparator for EntryComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self.cmp
            .compare(entry_internal_key(a), entry_internal_key(b))
    }
}

/// Strips the varint32 length prefix off an encoded entry, yielding the
/// internal key. Entries are only ever produced by [`MemTable::add`], so
/// a malformed prefix is unreachable.
fn entry_internal_key(entry: &[u8]) -> &[u8] {
    let mut p = entry;
    match get_varint32(&mut p) {
        Some(len) => &p[..len as usize],
        None => unreachable!("malformed memtable entry"),
    }
}

pub struct MemTable {
    cmp: InternalKeyComparator,
    list: SkipList<EntryComparator>,
    usage: AtomicUsize,
}

impl MemTable {
    #[must_use]
    pub fn new(cmp: InternalKeyComparator) -> MemTable {
        MemTable {
            cmp: cmp.clone(),
            list: SkipList::new(EntryComparator { cmp }),
            usage: AtomicUsize::new(0),
        }
    }

    /// Records a write (or a tombstone, with [`ValueType::Deletion`] and
    /// an ignored empty value) at the given sequence number.
    ///
    /// Requires external synchronization: at most one `add` at a time.
    pub fn add(&self, seq: SequenceNumber, t: ValueType, key: &[u8], value: &[u8]) {
        let klength = key.len() + 8;
        let mut buf = Vec::with_capacity(5 + klength + 5 + value.len());
        encode_varint32(&mut buf, klength as u32);
        buf.extend_from_slice(key);
        put_fixed64(&mut buf, pack_sequence_and_type(seq, t));
        encode_varint32(&mut buf, value.len() as u32);
        buf.extend_from_slice(value);

        self.usage.fetch_add(buf.len(), AtomicOrdering::Relaxed);
        self.list.insert(buf);
    }

    /// Looks up the newest version of the key at or below the lookup
    /// key's snapshot.
    ///
    /// Returns `Some(Ok(value))` if that version is a regular write,
    /// `Some(Err(NotFound))` if it is a tombstone, and `None` if this
    /// table holds nothing for the key (the caller should consult older
    /// sources).
    pub fn get(&self, key: &LookupKey) -> Option<Result<Vec<u8>>> {
        let mut iter = self.list.iter();
        iter.seek(key.memtable_key());
        if !iter.valid() {
            return None;
        }

        // The seek landed at the first entry >= the lookup key. It is
        // only an answer if its user-key portion matches exactly; the
        // sequence portion needs no check because the seek tag already
        // bounds it.
        let entry = iter.key();
        let mut p = entry;
        let klength = get_varint32(&mut p)? as usize;
        let internal_key = &p[..klength];
        let user_key = &internal_key[..klength - 8];
        if self
            .cmp
            .user_comparator()
            .compare(user_key, key.user_key())
            != Ordering::Equal
        {
            return None;
        }

        let tag = decode_fixed64(&internal_key[klength - 8..]);
        match ValueType::from_u8((tag & 0xff) as u8) {
            Some(ValueType::Value) => {
                let mut rest = &p[klength..];
                let value = get_length_prefixed_slice(&mut rest)?;
                Some(Ok(value.to_vec()))
            }
            Some(ValueType::Deletion) => Some(Err(Error::NotFound(
                String::from_utf8_lossy(key.user_key()).into_owned(),
            ))),
            None => None,
        }
    }

    /// Iterator over the table's entries in internal-key order. Keys it
    /// yields are internal keys; values are the raw user values.
    #[must_use]
    pub fn iter(&self) -> MemTableIter<'_> {
        MemTableIter {
            iter: self.list.iter(),
            scratch: Vec::new(),
        }
    }

    /// Rough count of bytes consumed by entries, used by the engine to
    /// decide when to rotate the table out for a flush.
    #[must_use]
    pub fn approximate_memory_usage(&self) -> usize {
        self.usage.load(AtomicOrdering::Relaxed)
    }
}

pub struct MemTableIter<'a> {
    iter: SkipListIter<'a, EntryComparator>,
    // Reused buffer for encoding seek targets into entry form.
    scratch: Vec<u8>,
}

impl<'a> Iter for MemTableIter<'a> {
    fn valid(&self) -> bool {
        self.iter.valid()
    }

    fn seek_to_first(&mut self) {
        self.iter.seek_to_first();
    }

    fn seek_to_last(&mut self) {
        self.iter.seek_to_last();
    }

    fn seek(&mut self, target: &[u8]) {
        // Targets arrive as bare internal keys; the list stores them
        // length-prefixed.
        self.scratch.clear();
        encode_varint32(&mut self.scratch, target.len() as u32);
        self.scratch.extend_from_slice(target);
        self.iter.seek(&self.scratch);
    }

    fn next(&mut self) {
        self.iter.next();
    }

    fn prev(&mut self) {
        self.iter.prev();
    }

    fn key(&self) -> &[u8] {
        entry_internal_key(self.iter.key())
    }

    fn value(&self) -> &[u8] {
        let entry = self.iter.key();
        let mut p = entry;
        match get_varint32(&mut p) {
            Some(klength) => {
                let mut rest = &p[klength as usize..];
                get_length_prefixed_slice(&mut rest).unwrap_or(&[])
            }
            None => unreachable!("malformed memtable entry"),
        }
    }

    fn status(&self) -> Result<()> {
        Ok(())
    }
}

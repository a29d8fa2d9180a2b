use std::cmp::Ordering;
use std::sync::Arc;

use crate::*;

fn ikey(user_key: &[u8], seq: u64, t: ValueType) -> Vec<u8> {
    let mut k = Vec::new();
    append_internal_key(&mut k, user_key, seq, t);
    k
}

fn icmp() -> InternalKeyComparator {
    InternalKeyComparator::new(Arc::new(BytewiseComparator))
}

#[test]
fn internal_keys_order_by_user_key_then_descending_seq() {
    let cmp = icmp();

    // Same user key: the larger sequence number sorts first.
    let newer = ikey(b"k", 5, ValueType::Value);
    let older = ikey(b"k", 2, ValueType::Value);
    assert_eq!(cmp.compare(&newer, &older), Ordering::Less);
    assert_eq!(cmp.compare(&older, &newer), Ordering::Greater);

    // Different user keys follow the user comparator.
    let a = ikey(b"a", 1, ValueType::Value);
    let b = ikey(b"b", 100, ValueType::Value);
    assert_eq!(cmp.compare(&a, &b), Ordering::Less);

    // On sequence tie the higher type sorts first.
    let put = ikey(b"k", 3, ValueType::Value);
    let del = ikey(b"k", 3, ValueType::Deletion);
    assert_eq!(cmp.compare(&put, &del), Ordering::Less);
}

#[test]
fn pack_and_extract() {
    let tag = pack_sequence_and_type(7, ValueType::Deletion);
    assert_eq!(tag, 7 << 8);
    let tag = pack_sequence_and_type(MAX_SEQUENCE_NUMBER, TYPE_FOR_SEEK);
    assert_eq!(tag >> 8, MAX_SEQUENCE_NUMBER);
    assert_eq!(tag & 0xff, 1);

    let k = ikey(b"user", 9, ValueType::Value);
    assert_eq!(extract_user_key(&k), b"user");
}

#[test]
fn lookup_key_views_share_one_buffer() {
    let lk = LookupKey::new(b"hello", 42);

    assert_eq!(lk.user_key(), b"hello");

    let internal = lk.internal_key();
    assert_eq!(&internal[..5], b"hello");
    assert_eq!(internal.len(), 5 + 8);
    let tag = coding::decode_fixed64(&internal[5..]);
    assert_eq!(tag, pack_sequence_and_type(42, TYPE_FOR_SEEK));

    // Memtable key = varint32 length prefix + internal key.
    let mut mk = lk.memtable_key();
    let span = coding::get_length_prefixed_slice(&mut mk).unwrap();
    assert_eq!(span, lk.internal_key());
}

#[test]
fn bytewise_shortest_separator() {
    let cmp = BytewiseComparator;

    let mut start = b"foo".to_vec();
    cmp.find_shortest_separator(&mut start, b"hello");
    assert_eq!(start, b"g");

    // Prefix relationship: no shortening.
    let mut start = b"foo".to_vec();
    cmp.find_shortest_separator(&mut start, b"foobar");
    assert_eq!(start, b"foo");

    // Adjacent diff bytes: no room to split.
    let mut start = b"abc1".to_vec();
    cmp.find_shortest_separator(&mut start, b"abc2");
    assert_eq!(start, b"abc1");
}

#[test]
fn bytewise_short_successor() {
    let cmp = BytewiseComparator;

    let mut key = b"abc".to_vec();
    cmp.find_short_successor(&mut key);
    assert_eq!(key, b"b");

    let mut key = vec![0xff, 0xff, b'a'];
    cmp.find_short_successor(&mut key);
    assert_eq!(key, vec![0xff, 0xff, b'b']);

    // All 0xff: left alone.
    let mut key = vec![0xff, 0xff];
    cmp.find_short_successor(&mut key);
    assert_eq!(key, vec![0xff, 0xff]);
}

#[test]
fn internal_separator_reextends_with_max_tag() {
    let cmp = icmp();

    let mut start = ikey(b"foo", 100, ValueType::Value);
    let limit = ikey(b"hello", 200, ValueType::Value);
    let original = start.clone();
    cmp.find_shortest_separator(&mut start, &limit);

    // Shortened user key "g" plus the earliest-sorting tag.
    assert_eq!(extract_user_key(&start), b"g");
    let tag = coding::decode_fixed64(&start[start.len() - 8..]);
    assert_eq!(tag, pack_sequence_and_type(MAX_SEQUENCE_NUMBER, TYPE_FOR_SEEK));
    assert_eq!(cmp.compare(&original, &start), Ordering::Less);
    assert_eq!(cmp.compare(&start, &limit), Ordering::Less);
}

#[test]
fn internal_separator_noop_when_user_key_unchanged() {
    let cmp = icmp();

    let mut start = ikey(b"foo", 100, ValueType::Value);
    let limit = ikey(b"foobar", 200, ValueType::Value);
    let original = start.clone();
    cmp.find_shortest_separator(&mut start, &limit);
    assert_eq!(start, original);
}

#[test]
fn empty_iter_latches_status() {
    let it = EmptyIter::with_status(Error::Corruption("bad block contents".into()));
    assert!(!it.valid());
    assert!(it.status().unwrap_err().is_corruption());
    // Status survives repeated queries.
    assert!(it.status().unwrap_err().is_corruption());

    let ok = EmptyIter::new();
    assert!(ok.status().is_ok());
}

#[test]
fn value_type_decoding() {
    assert_eq!(ValueType::from_u8(0), Some(ValueType::Deletion));
    assert_eq!(ValueType::from_u8(1), Some(ValueType::Value));
    assert_eq!(ValueType::from_u8(2), None);
}

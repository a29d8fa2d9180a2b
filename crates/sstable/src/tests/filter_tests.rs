use std::sync::Arc;

use coding::{get_length_prefixed_slice, put_length_prefixed_slice};
use common::FilterPolicy;

use crate::filter_block::{FilterBlockBuilder, FilterBlockReader};

/// Deterministic filter for tests: stores every key verbatim, matches
/// exactly. No false positives, so assertions can be strict.
struct ExactFilterPolicy;

impl FilterPolicy for ExactFilterPolicy {
    fn name(&self) -> &'static str {
        "test.ExactFilter"
    }

    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>) {
        for key in keys {
            put_length_prefixed_slice(dst, key);
        }
    }

    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool {
        let mut input = filter;
        while let Some(stored) = get_length_prefixed_slice(&mut input) {
            if stored == key {
                return true;
            }
        }
        false
    }
}

fn policy() -> Arc<dyn FilterPolicy> {
    Arc::new(ExactFilterPolicy)
}

#[test]
fn empty_builder_produces_trailer_only() {
    let mut builder = FilterBlockBuilder::new(policy());
    let contents = builder.finish().to_vec();
    // array_offset(0) + base_lg; no filters at all.
    assert_eq!(contents, vec![0, 0, 0, 0, 11]);

    let reader = FilterBlockReader::new(policy(), contents);
    // No filters to consult: must err toward "may match".
    assert!(reader.key_may_match(0, b"foo"));
    assert!(reader.key_may_match(100_000, b"foo"));
}

#[test]
fn single_chunk_no_false_negatives() {
    let mut builder = FilterBlockBuilder::new(policy());
    builder.start_block(100);
    builder.add_key(b"foo");
    builder.add_key(b"bar");
    builder.add_key(b"box");
    builder.start_block(200);
    builder.add_key(b"box");
    builder.start_block(300);
    builder.add_key(b"hello");
    let contents = builder.finish().to_vec();

    let reader = FilterBlockReader::new(policy(), contents);
    // Offsets 100..300 all land in filter index 0 (base 2048).
    assert!(reader.key_may_match(100, b"foo"));
    assert!(reader.key_may_match(100, b"bar"));
    assert!(reader.key_may_match(100, b"box"));
    assert!(reader.key_may_match(100, b"hello"));
    assert!(!reader.key_may_match(100, b"missing"));
    assert!(!reader.key_may_match(100, b"other"));
}

#[test]
fn multi_chunk_ranges_are_independent() {
    let mut builder = FilterBlockBuilder::new(policy());

    // First filter range: blocks at offsets 0 and 512.
    builder.start_block(0);
    builder.add_key(b"first");
    builder.start_block(512);
    builder.add_key(b"second");

    // Second filter range.
    builder.start_block(3000);
    builder.add_key(b"third");

    // Range 4..5: two empty ranges are skipped in between.
    builder.start_block(9000);
    builder.add_key(b"fourth");

    let contents = builder.finish().to_vec();
    let reader = FilterBlockReader::new(policy(), contents);

    assert!(reader.key_may_match(0, b"first"));
    assert!(reader.key_may_match(512, b"second"));
    assert!(!reader.key_may_match(0, b"third"));
    assert!(!reader.key_may_match(0, b"fourth"));

    assert!(reader.key_may_match(3000, b"third"));
    assert!(!reader.key_may_match(3000, b"first"));
    assert!(!reader.key_may_match(3000, b"fourth"));

    assert!(reader.key_may_match(9000, b"fourth"));
    assert!(!reader.key_may_match(9000, b"first"));

    // The skipped ranges hold no keys: authoritative no-match.
    assert!(!reader.key_may_match(4100, b"first"));
    assert!(!reader.key_may_match(6200, b"third"));
}

#[test]
fn out_of_range_offset_may_match() {
    let mut builder = FilterBlockBuilder::new(policy());
    builder.start_block(0);
    builder.add_key(b"only");
    let contents = builder.finish().to_vec();

    let reader = FilterBlockReader::new(policy(), contents);
    assert!(reader.key_may_match(0, b"only"));
    // Offset far past every emitted filter: advisory "may match".
    assert!(reader.key_may_match(1 << 30, b"anything"));
}

#[test]
fn malformed_block_may_match() {
    let reader = FilterBlockReader::new(policy(), Vec::new());
    assert!(reader.key_may_match(0, b"k"));

    // array_offset pointing past the buffer.
    let reader = FilterBlockReader::new(policy(), vec![0xff, 0xff, 0xff, 0xff, 11]);
    assert!(reader.key_may_match(0, b"k"));
}

#[test]
fn bloom_backed_filter_block() {
    let policy: Arc<dyn FilterPolicy> = Arc::new(bloom::BloomFilterPolicy::new(10));
    let mut builder = FilterBlockBuilder::new(Arc::clone(&policy));
    builder.start_block(0);
    let keys: Vec<Vec<u8>> = (0..100u32).map(|i| format!("key{i}").into_bytes()).collect();
    for key in &keys {
        builder.add_key(key);
    }
    let contents = builder.finish().to_vec();

    let reader = FilterBlockReader::new(policy, contents);
    for key in &keys {
        assert!(reader.key_may_match(0, key), "false negative for {key:?}");
    }
}

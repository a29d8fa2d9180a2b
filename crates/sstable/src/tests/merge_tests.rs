use std::sync::Arc;

use common::{BytewiseComparator, Comparator, Iter};

use crate::merge::MergingIter;

use super::{collect_backward, collect_forward, VecIter};

fn cmp() -> Arc<dyn Comparator> {
    Arc::new(BytewiseComparator)
}

fn merging(children: Vec<VecIter>) -> MergingIter {
    MergingIter::new(
        cmp(),
        children
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn Iter>)
            .collect(),
    )
}

#[test]
fn empty_children_merge_to_nothing() {
    let mut iter = merging(vec![]);
    iter.seek_to_first();
    assert!(!iter.valid());

    let mut iter = merging(vec![VecIter::new(vec![]), VecIter::new(vec![])]);
    iter.seek_to_first();
    assert!(!iter.valid());
    iter.seek_to_last();
    assert!(!iter.valid());
    iter.seek(b"x");
    assert!(!iter.valid());
    assert!(iter.status().is_ok());
}

#[test]
fn forward_merge_is_sorted_union() {
    let mut iter = merging(vec![
        VecIter::from_keys(&["a", "d", "g"]),
        VecIter::from_keys(&["b", "e", "h"]),
        VecIter::from_keys(&["c", "f", "i"]),
    ]);

    let keys: Vec<Vec<u8>> = collect_forward(&mut iter).into_iter().map(|e| e.0).collect();
    let want: Vec<Vec<u8>> = ["a", "b", "c", "d", "e", "f", "g", "h", "i"]
        .iter()
        .map(|k| k.as_bytes().to_vec())
        .collect();
    assert_eq!(keys, want);
}

#[test]
fn duplicates_across_children_are_preserved() {
    let mut iter = merging(vec![
        VecIter::from_keys(&["a", "c"]),
        VecIter::from_keys(&["a", "b", "c"]),
    ]);

    let keys: Vec<Vec<u8>> = collect_forward(&mut iter).into_iter().map(|e| e.0).collect();
    let want: Vec<Vec<u8>> = ["a", "a", "b", "c", "c"]
        .iter()
        .map(|k| k.as_bytes().to_vec())
        .collect();
    assert_eq!(keys, want);
}

#[test]
fn backward_merge_mirrors_forward() {
    let children = || {
        vec![
            VecIter::from_keys(&["a", "d", "e"]),
            VecIter::from_keys(&["b", "c", "f"]),
        ]
    };

    let mut forward = collect_forward(&mut merging(children()));
    let backward = collect_backward(&mut merging(children()));
    forward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn seek_positions_all_children() {
    let mut iter = merging(vec![
        VecIter::from_keys(&["a", "d", "g"]),
        VecIter::from_keys(&["b", "e", "h"]),
    ]);

    iter.seek(b"c");
    assert!(iter.valid());
    assert_eq!(iter.key(), b"d");
    iter.next();
    assert_eq!(iter.key(), b"e");

    iter.seek(b"a");
    assert_eq!(iter.key(), b"a");

    iter.seek(b"z");
    assert!(!iter.valid());
}

#[test]
fn direction_reversal_revisits_same_keys() {
    let mut iter = merging(vec![
        VecIter::from_keys(&["a", "c", "e", "g"]),
        VecIter::from_keys(&["b", "d", "f"]),
    ]);

    // Walk to the middle going forward.
    iter.seek_to_first();
    iter.next();
    iter.next();
    iter.next();
    assert_eq!(iter.key(), b"d");

    // Turn around: must see the exact reverse sequence.
    iter.prev();
    assert_eq!(iter.key(), b"c");
    iter.prev();
    assert_eq!(iter.key(), b"b");

    // And turn around again.
    iter.next();
    assert_eq!(iter.key(), b"c");
    iter.next();
    assert_eq!(iter.key(), b"d");
    iter.next();
    assert_eq!(iter.key(), b"e");
}

#[test]
fn reversal_with_duplicate_keys() {
    let mut iter = merging(vec![
        VecIter::from_keys(&["a", "b"]),
        VecIter::from_keys(&["b", "c"]),
    ]);

    iter.seek_to_first();
    assert_eq!(iter.key(), b"a");
    iter.next();
    assert_eq!(iter.key(), b"b");
    iter.next();
    assert_eq!(iter.key(), b"b");
    iter.next();
    assert_eq!(iter.key(), b"c");

    iter.prev();
    assert_eq!(iter.key(), b"b");
    iter.prev();
    assert_eq!(iter.key(), b"b");
    iter.prev();
    assert_eq!(iter.key(), b"a");
    iter.prev();
    assert!(!iter.valid());
}

use std::cmp::Ordering;
use std::sync::Arc;

use coding::{decode_fixed64, put_fixed64};

use crate::key::{extract_user_key, pack_sequence_and_type, MAX_SEQUENCE_NUMBER, TYPE_FOR_SEEK};

/// Three-way ordering contract over byte-string keys.
///
/// `find_shortest_separator` and `find_short_successor` exist so index
/// blocks can store short key boundaries instead of full keys; both are
/// allowed to leave their argument unchanged.
pub trait Comparator: Send + Sync {
    /// Three-way comparison. Must be a total order.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Identity of this ordering; persisted formats must not mix orders.
    fn name(&self) -> &'static str;

    /// If possible, shortens `start` to some key in `[start, limit)`.
    ///
    /// Requires `start < limit` under this ordering.
    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]);

    /// If possible, shortens `key` to some key `>= key`.
    fn find_short_successor(&self, key: &mut Vec<u8>);
}

/// Plain lexicographic byte order.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn name(&self) -> &'static str {
        "stratumkv.BytewiseComparator"
    }

    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]) {
        let min_length = start.len().min(limit.len());
        let mut diff_index = 0;
        while diff_index < min_length && start[diff_index] == limit[diff_index] {
            diff_index += 1;
        }

        if diff_index >= min_length {
            // One key is a prefix of the other; nothing shorter separates.
            return;
        }

        let diff_byte = start[diff_index];
        if diff_byte < 0xff && diff_byte + 1 < limit[diff_index] {
            start[diff_index] += 1;
            start.truncate(diff_index + 1);
            debug_assert_eq!(self.compare(start, limit), Ordering::Less);
        }
    }

    fn find_short_successor(&self, key: &mut Vec<u8>) {
        for i in 0..key.len() {
            if key[i] != 0xff {
                key[i] += 1;
                key.truncate(i + 1);
                return;
            }
        }
        // key is a run of 0xff bytes; leave it alone.
    }
}

/// Orders internal keys: user-key ascending (per the wrapped comparator),
/// then the 8-byte tag as an unsigned integer **descending**, so the
/// newest write for a user key sorts first.
#[derive(Clone)]
pub struct InternalKeyComparator {
    user_comparator: Arc<dyn Comparator>,
}

impl InternalKeyComparator {
    #[must_use]
    pub fn new(user_comparator: Arc<dyn Comparator>) -> InternalKeyComparator {
        InternalKeyComparator { user_comparator }
    }

    /// The wrapped user-key comparator.
    #[must_use]
    pub fn user_comparator(&self) -> &Arc<dyn Comparator> {
        &self.user_comparator
    }
}

impl Comparator for InternalKeyComparator {
    fn compare(&self, akey: &[u8], bkey: &[u8]) -> Ordering {
        let r = self
            .user_comparator
            .compare(extract_user_key(akey), extract_user_key(bkey));
        if r != Ordering::Equal {
            return r;
        }
        let anum = decode_fixed64(&akey[akey.len() - 8..]);
        let bnum = decode_fixed64(&bkey[bkey.len() - 8..]);
        // Larger (sequence, type) sorts first.
        bnum.cmp(&anum)
    }

    fn name(&self) -> &'static str {
        "stratumkv.InternalKeyComparator"
    }

    fn find_shortest_separator(&self, start: &mut Vec<u8>, limit: &[u8]) {
        // Attempt to shorten the user portion of the key.
        let user_start = extract_user_key(start);
        let user_limit = extract_user_key(limit);
        let mut tmp = user_start.to_vec();
        self.user_comparator
            .find_shortest_separator(&mut tmp, user_limit);
        if tmp.len() < user_start.len()
            && self.user_comparator.compare(user_start, &tmp) == Ordering::Less
        {
            // User key is physically shorter but logically larger. Tack on
            // the earliest possible tag so the result still sorts before
            // every internal key with that user key.
            put_fixed64(
                &mut tmp,
                pack_sequence_and_type(MAX_SEQUENCE_NUMBER, TYPE_FOR_SEEK),
            );
            debug_assert_eq!(self.compare(start, &tmp), Ordering::Less);
            debug_assert_eq!(self.compare(&tmp, limit), Ordering::Less);
            *start = tmp;
        }
    }

    fn find_short_successor(&self, key: &mut Vec<u8>) {
        let user_key = extract_user_key(key);
        let mut tmp = user_key.to_vec();
        self.user_comparator.find_short_successor(&mut tmp);
        if tmp.len() < user_key.len()
            && self.user_comparator.compare(user_key, &tmp) == Ordering::Less
        {
            put_fixed64(
                &mut tmp,
                pack_sequence_and_type(MAX_SEQUENCE_NUMBER, TYPE_FOR_SEEK),
            );
            debug_assert_eq!(self.compare(key, &tmp), Ordering::Less);
            *key = tmp;
        }
    }
}

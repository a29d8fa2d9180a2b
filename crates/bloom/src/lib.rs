//! # Bloom filter policy
//!
//! A space-efficient probabilistic set-membership filter. It can say with
//! certainty that a key is **not** in a set (no false negatives), but may
//! occasionally say a key **is** present when it isn't (false positives).
//!
//! ## Usage in StratumKV
//!
//! Each sstable embeds one filter per 2 KiB range of data-block offsets.
//! During point lookups the table checks the filter first — a "not
//! present" answer skips the data-block read entirely.
//!
//! ## Filter format
//!
//! `create_filter` appends the raw bit array followed by a single byte
//! holding the probe count `k`, so each filter is self-describing and a
//! reader built with a different `bits_per_key` still interprets it
//! correctly.

use common::FilterPolicy;

/// Bloom `FilterPolicy` using double hashing: probe `i` lands at
/// `h1 + i * h2` where `h1`/`h2` are FNV-1a with two different bases.
pub struct BloomFilterPolicy {
    bits_per_key: usize,
    /// Probes per key, derived as `bits_per_key * ln(2)`, clamped to [1, 30].
    k: usize,
}

impl BloomFilterPolicy {
    /// Creates a policy sized at `bits_per_key` filter bits per key.
    /// 10 bits/key gives roughly a 1% false positive rate.
    #[must_use]
    pub fn new(bits_per_key: usize) -> BloomFilterPolicy {
        // Rounding down slightly reduces probe count, trading a little
        // false-positive rate for less hashing.
        let k = ((bits_per_key as f64) * std::f64::consts::LN_2) as usize;
        let k = k.clamp(1, 30);
        BloomFilterPolicy { bits_per_key, k }
    }
}

impl Default for BloomFilterPolicy {
    fn default() -> Self {
        BloomFilterPolicy::new(10)
    }
}

impl FilterPolicy for BloomFilterPolicy {
    fn name(&self) -> &'static str {
        "stratumkv.BuiltinBloomFilter"
    }

    fn create_filter(&self, keys: &[&[u8]], dst: &mut Vec<u8>) {
        // A 64-bit floor keeps the false-positive rate sane for very
        // small key sets.
        let bits = (keys.len() * self.bits_per_key).max(64);
        let bytes = (bits + 7) / 8;
        let bits = (bytes * 8) as u64;

        let init_size = dst.len();
        dst.resize(init_size + bytes, 0);
        dst.push(self.k as u8);
        let array = &mut dst[init_size..init_size + bytes];

        for key in keys {
            let (h1, h2) = hash_pair(key);
            for i in 0..self.k {
                let bit = probe(h1, h2, i as u64) % bits;
                array[(bit / 8) as usize] |= 1 << (bit % 8);
            }
        }
    }

    fn key_may_match(&self, key: &[u8], filter: &[u8]) -> bool {
        if filter.len() < 2 {
            return false;
        }
        let array = &filter[..filter.len() - 1];
        let bits = (array.len() * 8) as u64;
        let k = filter[filter.len() - 1] as usize;
        if k > 30 {
            // Reserved for future encodings; treat as a match.
            return true;
        }

        let (h1, h2) = hash_pair(key);
        for i in 0..k {
            let bit = probe(h1, h2, i as u64) % bits;
            if array[(bit / 8) as usize] & (1 << (bit % 8)) == 0 {
                return false;
            }
        }
        true
    }
}

/// Two independent 64-bit hashes from FNV-1a with different bases.
fn hash_pair(key: &[u8]) -> (u64, u64) {
    let h1 = fnv1a_64(key, 0xcbf2_9ce4_8422_2325);
    let h2 = fnv1a_64(key, 0x517c_c1b7_2722_0a95);
    (h1, h2)
}

/// Double hashing: probe(i) = h1 + i * h2.
fn probe(h1: u64, h2: u64, i: u64) -> u64 {
    h1.wrapping_add(i.wrapping_mul(h2))
}

/// FNV-1a 64-bit hash with a configurable starting basis.
fn fnv1a_64(data: &[u8], basis: u64) -> u64 {
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = basis;
    for &byte in data {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

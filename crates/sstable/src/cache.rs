//! Shared cache of decoded data blocks.
//!
//! Cached blocks are handed out as `Arc<Block>` clones, so a block
//! evicted from the cache stays alive until the last iterator reading it
//! is dropped. That replaces explicit handle release calls with ordinary
//! ownership.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::block::Block;
use std::sync::Arc;

/// Cache capability consumed by [`crate::Table`].
///
/// Keys are opaque byte strings (tables use a 16-byte id/offset pair).
/// Implementations must be thread-safe.
pub trait BlockCache: Send + Sync {
    fn lookup(&self, key: &[u8]) -> Option<Arc<Block>>;

    /// Inserts `block`, accounted at `charge` bytes against capacity.
    fn insert(&self, key: Vec<u8>, block: Arc<Block>, charge: usize);

    /// A fresh id, distinct from every id previously returned. Each open
    /// table takes one to namespace its cache keys.
    fn new_id(&self) -> u64;
}

struct CacheEntry {
    block: Arc<Block>,
    charge: usize,
    /// Recency stamp; larger means more recently used.
    stamp: u64,
}

struct CacheState {
    entries: HashMap<Vec<u8>, CacheEntry>,
    /// stamp -> key, ordered oldest first for eviction.
    recency: BTreeMap<u64, Vec<u8>>,
    usage: usize,
    next_stamp: u64,
}

/// Least-recently-used [`BlockCache`] with a byte-size capacity.
pub struct LruBlockCache {
    capacity: usize,
    state: Mutex<CacheState>,
    next_id: AtomicU64,
}

impl LruBlockCache {
    #[must_use]
    pub fn new(capacity: usize) -> LruBlockCache {
        LruBlockCache {
            capacity,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: BTreeMap::new(),
                usage: 0,
                next_stamp: 0,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Bytes currently charged against capacity.
    #[must_use]
    pub fn usage(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.usage,
            Err(poisoned) => poisoned.into_inner().usage,
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(state) => state,
            // The cache holds no invariants a panic could break mid-way
            // that eviction cannot repair; keep serving.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl BlockCache for LruBlockCache {
    fn lookup(&self, key: &[u8]) -> Option<Arc<Block>> {
        let mut state = self.locked();
        let stamp = state.next_stamp;
        state.next_stamp += 1;
        let entry = state.entries.get_mut(key)?;
        let old_stamp = entry.stamp;
        entry.stamp = stamp;
        let block = Arc::clone(&entry.block);
        state.recency.remove(&old_stamp);
        state.recency.insert(stamp, key.to_vec());
        Some(block)
    }

    fn insert(&self, key: Vec<u8>, block: Arc<Block>, charge: usize) {
        let mut state = self.locked();
        let stamp = state.next_stamp;
        state.next_stamp += 1;

        if let Some(old) = state.entries.remove(&key) {
            state.recency.remove(&old.stamp);
            state.usage -= old.charge;
        }
        state.recency.insert(stamp, key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                block,
                charge,
                stamp,
            },
        );
        state.usage += charge;

        // Evict oldest entries until within capacity. Evicted blocks may
        // outlive eviction through Arcs held by live iterators.
        while state.usage > self.capacity {
            let oldest = match state.recency.keys().next().copied() {
                Some(stamp) => stamp,
                None => break,
            };
            if let Some(victim_key) = state.recency.remove(&oldest) {
                if let Some(victim) = state.entries.remove(&victim_key) {
                    state.usage -= victim.charge;
                }
            }
        }
    }

    fn new_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#![forbid(unsafe_code)]

//! Result cache keyed by exact query string.
//!
//! [`ResultCache`] memoizes fetch outcomes so retyping a query that already
//! resolved does not hit the network again.
//!
//! # Keys
//!
//! Keys are compared byte-for-byte. `"acme"` and `"Acme"` are different
//! entries; there is no normalization or prefix aliasing, so a lookup never
//! returns an entry that was stored for another query.
//!
//! # Invalidation
//!
//! - [`ResultCache::invalidate`] drops a single query (used by retry).
//! - [`ResultCache::invalidate_all`] bumps the generation; every entry stored
//!   under an older generation reads as absent and is reclaimed lazily.
//!
//! # Eviction
//!
//! The cache is bounded. When an insert would exceed capacity, the least
//! recently used entry is evicted. Entries from an older generation are
//! always evicted first.

use rustc_hash::FxHashMap;

use crate::error::FetchError;
use crate::item::ResultSet;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Fetch issued, no outcome yet.
    Pending,
    /// Fetch succeeded.
    Ready,
    /// Fetch failed; results are empty.
    Failed,
}

/// Outcome (or pending placeholder) for one query.
#[derive(Debug)]
pub struct CacheEntry<R> {
    /// Results in fetch order. Empty unless `status` is `Ready`.
    pub results: ResultSet<R>,
    /// Lifecycle state.
    pub status: EntryStatus,
    /// Sequence number of the fetch that created this entry.
    pub issued_seq: u64,
    /// Failure detail when `status` is `Failed`.
    pub error: Option<FetchError>,
}

impl<R> CacheEntry<R> {
    /// Placeholder for an in-flight fetch.
    pub fn pending(issued_seq: u64) -> Self {
        Self {
            results: ResultSet::empty(),
            status: EntryStatus::Pending,
            issued_seq,
            error: None,
        }
    }

    /// Successful outcome.
    pub fn ready(results: ResultSet<R>, issued_seq: u64) -> Self {
        Self {
            results,
            status: EntryStatus::Ready,
            issued_seq,
            error: None,
        }
    }

    /// Failed outcome.
    pub fn failed(error: FetchError, issued_seq: u64) -> Self {
        Self {
            results: ResultSet::empty(),
            status: EntryStatus::Failed,
            issued_seq,
            error: Some(error),
        }
    }

    /// Whether the fetch has settled (ready or failed).
    pub fn is_settled(&self) -> bool {
        self.status != EntryStatus::Pending
    }
}

impl<R> Clone for CacheEntry<R> {
    fn clone(&self) -> Self {
        Self {
            results: self.results.clone(),
            status: self.status,
            issued_seq: self.issued_seq,
            error: self.error.clone(),
        }
    }
}

#[derive(Debug)]
struct Slot<R> {
    entry: CacheEntry<R>,
    generation: u64,
    last_access: u64,
}

/// Statistics about cache performance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    /// Number of live entries.
    pub entries: usize,
    /// Lookups that found a live entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Hit rate as a fraction (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Bounded, LRU-evicting map from query string to [`CacheEntry`].
#[derive(Debug)]
pub struct ResultCache<R> {
    slots: FxHashMap<String, Slot<R>>,
    generation: u64,
    tick: u64,
    max_entries: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<R> ResultCache<R> {
    /// Create a cache holding at most `max_entries` queries (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            slots: FxHashMap::with_capacity_and_hasher(
                max_entries.min(1024),
                Default::default(),
            ),
            generation: 0,
            tick: 0,
            max_entries,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up `query`, marking it most recently used.
    pub fn get(&mut self, query: &str) -> Option<&CacheEntry<R>> {
        self.tick += 1;
        let tick = self.tick;
        let generation = self.generation;
        match self.slots.get_mut(query) {
            Some(slot) if slot.generation == generation => {
                self.hits += 1;
                slot.last_access = tick;
                Some(&slot.entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up `query` without touching recency or statistics.
    pub fn peek(&self, query: &str) -> Option<&CacheEntry<R>> {
        self.slots
            .get(query)
            .filter(|slot| slot.generation == self.generation)
            .map(|slot| &slot.entry)
    }

    /// Store `entry` under `query`, replacing any previous entry.
    pub fn put(&mut self, query: &str, entry: CacheEntry<R>) {
        self.tick += 1;
        if !self.slots.contains_key(query) && self.slots.len() >= self.max_entries {
            self.evict_lru();
        }
        self.slots.insert(
            query.to_owned(),
            Slot {
                entry,
                generation: self.generation,
                last_access: self.tick,
            },
        );
    }

    /// Drop the entry for `query`. Returns whether one was live.
    pub fn invalidate(&mut self, query: &str) -> bool {
        self.slots
            .remove(query)
            .is_some_and(|slot| slot.generation == self.generation)
    }

    /// Treat every stored entry as absent.
    #[inline]
    pub fn invalidate_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Remove all entries immediately.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.generation == self.generation)
            .count()
    }

    /// Whether there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of stored queries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total = self.hits + self.misses;
        CacheStats {
            entries: self.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate: if total > 0 {
                self.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Reset hit/miss/eviction counters.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    fn evict_lru(&mut self) {
        let generation = self.generation;
        let victim = self
            .slots
            .iter()
            .min_by_key(|(_, slot)| (slot.generation == generation, slot.last_access))
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            self.slots.remove(&key);
            self.evictions += 1;
        }
    }
}

impl<R> Default for ResultCache<R> {
    /// Cache with room for 64 queries.
    fn default() -> Self {
        Self::new(64)
    }
}

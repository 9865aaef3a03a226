//! Result cache
//!
//! A least-recently-used map from request key to [`PhonemeResult`], bounded
//! by entry count and by estimated memory. Recency is tracked with a
//! monotonically increasing tick per entry and a `BTreeMap<tick, key>` index,
//! so the oldest entry is always the first key of the index.
//!
//! # Architecture
//!
//! ```text
//!   get(key) ──► Mutex<CacheState> ──► entries: HashMap<key, Entry{result, size, tick}>
//!                                  └─► recency: BTreeMap<tick, key>   (oldest first)
//! ```
//!
//! Every `get` that hits bumps the entry's tick, so readers also take the
//! lock. Hit/miss/eviction counters are atomics read without locking.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use xxhash_rust::xxh3::xxh3_128;

use crate::core::{PhonemeOptions, PhonemeResult};
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Fixed bytes charged per entry on top of its phoneme strings
pub const ENTRY_OVERHEAD_BYTES: usize = 64;

pub type CacheKey = u128;

/// Key for a (language, text, options) request
///
/// `language` should already be canonical so `en-us` and `en-US` share entries.
pub fn cache_key(language: &str, text: &str, options: &PhonemeOptions) -> CacheKey {
    let mut buf = Vec::with_capacity(language.len() + text.len() + 8);
    buf.extend_from_slice(language.as_bytes());
    buf.push(0);
    buf.extend_from_slice(&options.fingerprint());
    buf.push(0);
    buf.extend_from_slice(text.as_bytes());
    xxh3_128(&buf)
}

/// Estimated footprint of a cached result
pub fn estimate_size(result: &PhonemeResult) -> usize {
    result.phonemes.iter().map(String::len).sum::<usize>() + ENTRY_OVERHEAD_BYTES
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub count: usize,
    pub memory_bytes: usize,
    pub max_entries: usize,
    pub max_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry {
    result: PhonemeResult,
    size: usize,
    tick: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Entry>,
    recency: BTreeMap<u64, CacheKey>,
    next_tick: u64,
    memory_bytes: usize,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        self.memory_bytes -= entry.size;
        Some(entry)
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.memory_bytes -= entry.size;
        }
        true
    }
}

/// Bounded LRU cache of phonemization results
pub struct ResultCache {
    state: Mutex<CacheState>,
    max_entries: usize,
    max_bytes: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl ResultCache {
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries,
            max_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a result, marking it most recently used
    ///
    /// The returned copy has `from_cache` set.
    pub fn get(&self, key: &CacheKey) -> Option<PhonemeResult> {
        let mut state = self.state.lock();
        let tick = state.tick();
        let CacheState {
            entries, recency, ..
        } = &mut *state;

        let Some(entry) = entries.get_mut(key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        recency.remove(&entry.tick);
        recency.insert(tick, *key);
        entry.tick = tick;
        self.hits.fetch_add(1, Ordering::Relaxed);

        let mut result = entry.result.clone();
        result.from_cache = true;
        Some(result)
    }

    /// Store a result, evicting least-recently-used entries to stay in bounds
    ///
    /// An entry larger than `max_bytes` is kept alone. With a zero capacity
    /// nothing can be stored and `CacheCapacityExceeded` is returned.
    pub fn insert(&self, key: CacheKey, result: PhonemeResult) -> PhonemizerResult<()> {
        let size = estimate_size(&result);
        if self.max_entries == 0 || self.max_bytes == 0 {
            return Err(PhonemizerError::CacheCapacityExceeded {
                size,
                capacity: self.max_bytes,
            });
        }

        let mut state = self.state.lock();
        state.remove(&key);

        let mut evicted = 0u64;
        while !state.entries.is_empty()
            && (state.entries.len() >= self.max_entries
                || state.memory_bytes + size > self.max_bytes)
        {
            if !state.evict_oldest() {
                break;
            }
            evicted += 1;
        }
        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
            tracing::debug!(evicted, "Evicted cache entries");
        }

        let tick = state.tick();
        state.recency.insert(tick, key);
        state.memory_bytes += size;
        state.entries.insert(
            key,
            Entry {
                result: PhonemeResult {
                    from_cache: false,
                    ..result
                },
                size,
                tick,
            },
        );
        Ok(())
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.state.lock().remove(key).is_some()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Drop every entry; counters are kept
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.recency.clear();
        state.memory_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            count: state.entries.len(),
            memory_bytes: state.memory_bytes,
            max_entries: self.max_entries,
            max_bytes: self.max_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn result(phonemes: &[&str]) -> PhonemeResult {
        PhonemeResult {
            phonemes: phonemes.iter().map(|s| s.to_string()).collect(),
            success: true,
            language: "en-US".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_marks_from_cache() {
        let cache = ResultCache::new(10, 1 << 20);
        cache.insert(1, result(&["k", "ae1", "t"])).unwrap();

        let hit = cache.get(&1).unwrap();
        assert!(hit.from_cache);
        assert_eq!(hit.phonemes, vec!["k", "ae1", "t"]);
        assert!(cache.get(&2).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_entry_bound_evicts_least_recently_used() {
        let cache = ResultCache::new(2, 1 << 20);
        cache.insert(1, result(&["a"])).unwrap();
        cache.insert(2, result(&["b"])).unwrap();
        // Touch 1 so 2 becomes the oldest
        cache.get(&1);
        cache.insert(3, result(&["c"])).unwrap();

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_memory_bound() {
        let size = estimate_size(&result(&["aa", "bb"]));
        let cache = ResultCache::new(100, size * 3);
        for key in 0..10 {
            cache.insert(key, result(&["aa", "bb"])).unwrap();
            assert!(cache.stats().memory_bytes <= size * 3);
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&9));
        assert!(!cache.contains(&0));
    }

    #[test]
    fn test_oversized_entry_kept_alone() {
        let cache = ResultCache::new(10, 100);
        cache.insert(1, result(&["a"])).unwrap();
        let big = result(&[&"x".repeat(200)]);
        let big_size = estimate_size(&big);
        cache.insert(2, big).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.memory_bytes, big_size);
        assert!(stats.memory_bytes <= stats.max_bytes + big_size);
    }

    #[test]
    fn test_zero_capacity_rejects() {
        let cache = ResultCache::new(0, 100);
        let err = cache.insert(1, result(&["a"])).unwrap_err();
        assert!(matches!(err, PhonemizerError::CacheCapacityExceeded { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_reinsert_replaces_without_growth() {
        let cache = ResultCache::new(10, 1 << 20);
        cache.insert(1, result(&["a"])).unwrap();
        cache.insert(1, result(&["a", "b"])).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.stats().memory_bytes,
            estimate_size(&result(&["a", "b"]))
        );
    }

    #[test]
    fn test_clear() {
        let cache = ResultCache::new(10, 1 << 20);
        cache.insert(1, result(&["a"])).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().memory_bytes, 0);
    }

    #[test]
    fn test_cache_key_distinguishes_inputs() {
        let options = PhonemeOptions::default();
        let stressed = PhonemeOptions {
            include_stress: true,
            ..Default::default()
        };
        let base = cache_key("en-US", "cat", &options);
        assert_eq!(base, cache_key("en-US", "cat", &options));
        assert_ne!(base, cache_key("en-GB", "cat", &options));
        assert_ne!(base, cache_key("en-US", "cats", &options));
        assert_ne!(base, cache_key("en-US", "cat", &stressed));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(ResultCache::new(50, 1 << 20));
        let handles: Vec<_> = (0..8u128)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..200u128 {
                        let key = (t * 1000) + (i % 20);
                        cache.insert(key, result(&["a"])).unwrap();
                        cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = cache.stats();
        assert!(stats.count <= 50);
        assert_eq!(stats.count, cache.len());
    }
}

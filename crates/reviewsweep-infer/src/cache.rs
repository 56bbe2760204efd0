//! Bounded LRU cache for text embeddings.
//!
//! The model never changes after load, so entries do not expire; the
//! least recently used entry is evicted once capacity is reached.

use std::collections::{BTreeMap, HashMap};

use ndarray::Array1;
use parking_lot::Mutex;

/// Thread-safe LRU cache of text → embedding.
pub struct QueryCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    /// text → (embedding, last access tick)
    entries: HashMap<String, (Array1<f32>, u64)>,
    /// last access tick → text, oldest first
    recency: BTreeMap<u64, String>,
    tick: u64,
    max_size: usize,
}

impl CacheInner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Mark `key` as most recently used. O(log n).
    fn touch(&mut self, key: &str) {
        let tick = self.next_tick();
        if let Some((_, last)) = self.entries.get_mut(key) {
            let old = std::mem::replace(last, tick);
            if let Some(k) = self.recency.remove(&old) {
                self.recency.insert(tick, k);
            }
        }
    }

    fn evict_oldest(&mut self) -> bool {
        match self.recency.pop_first() {
            Some((_, oldest)) => {
                self.entries.remove(&oldest);
                true
            }
            None => false,
        }
    }
}

impl QueryCache {
    /// Create a cache holding at most `max_size` embeddings.
    pub fn new(max_size: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::with_capacity(max_size),
                recency: BTreeMap::new(),
                tick: 0,
                max_size: max_size.max(1),
            }),
        }
    }

    /// Cache sized for one review session's worth of tokens.
    pub fn default_cache() -> Self {
        Self::new(4096)
    }

    pub fn get(&self, text: &str) -> Option<Array1<f32>> {
        let mut inner = self.inner.lock();
        let hit = inner.entries.get(text).map(|(emb, _)| emb.clone());
        if hit.is_some() {
            inner.touch(text);
        }
        hit
    }

    pub fn put(&self, text: String, embedding: Array1<f32>) {
        let mut inner = self.inner.lock();

        if let Some((slot, _)) = inner.entries.get_mut(&text) {
            *slot = embedding;
            inner.touch(&text);
            return;
        }

        let tick = inner.next_tick();
        inner.recency.insert(tick, text.clone());
        inner.entries.insert(text, (embedding, tick));
        while inner.entries.len() > inner.max_size {
            if !inner.evict_oldest() {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cache_hit_and_miss() {
        let cache = QueryCache::new(10);
        assert!(cache.get("rude").is_none());

        cache.put("rude".into(), array![1.0, 2.0, 3.0]);
        assert_eq!(cache.get("rude"), Some(array![1.0, 2.0, 3.0]));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_evicts_least_recent() {
        let cache = QueryCache::new(2);
        cache.put("a".into(), array![1.0]);
        cache.put("b".into(), array![2.0]);

        // "a" becomes most recent, so "b" is evicted next
        assert!(cache.get("a").is_some());
        cache.put("c".into(), array![3.0]);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_cache_eviction_follows_access_order() {
        let cache = QueryCache::new(3);
        for key in ["a", "b", "c"] {
            cache.put(key.into(), array![0.0]);
        }
        // Touch in reverse: "c" is now the least recent.
        for key in ["b", "a"] {
            assert!(cache.get(key).is_some());
        }
        cache.put("a".into(), array![1.0]);
        cache.put("d".into(), array![4.0]);
        cache.put("e".into(), array![5.0]);

        assert_eq!(cache.len(), 3);
        assert!(cache.get("c").is_none());
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a"), Some(array![1.0]));
        assert!(cache.get("e").is_some());
    }

    #[test]
    fn test_cache_overwrite_keeps_size() {
        let cache = QueryCache::new(2);
        cache.put("a".into(), array![1.0]);
        cache.put("a".into(), array![9.0]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), Some(array![9.0]));
    }
}

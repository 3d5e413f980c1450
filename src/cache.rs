//! Bounded least-recently-used store shared across threads.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Thread-safe LRU map from fingerprints to values.
///
/// `get` touches the entry, so both reads and writes take the lock.
pub struct LruStore<V> {
    inner: Mutex<LruCache<u64, V>>,
    capacity: NonZeroUsize,
}

impl<V: Clone> LruStore<V> {
    /// Zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            capacity,
        }
    }

    pub fn get(&self, key: u64) -> Option<V> {
        self.inner.lock().get(&key).cloned()
    }

    /// Insert or replace, evicting the least recently used entry when full.
    pub fn put(&self, key: u64, value: V) {
        self.inner.lock().put(key, value);
    }

    pub fn contains(&self, key: u64) -> bool {
        self.inner.lock().contains(&key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }
}

//! Identity cache
//!
//! Guarantees at most one live in-memory object per key. Entries are held
//! weakly: the cache never keeps an instance alive on its own, so once every
//! external owner drops its `Arc` the next lookup constructs a fresh object.
//! All durable state lives on disk, which makes that safe.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};

const MIN_PRUNE_THRESHOLD: usize = 64;

struct Entries<K, T> {
    map: HashMap<K, Weak<T>>,
    /// Dead entries are swept when the map grows past this size.
    prune_at: usize,
}

/// Weak, keyed registry of live instances.
pub struct IdentityCache<K, T> {
    entries: Mutex<Entries<K, T>>,
}

impl<K, T> Default for IdentityCache<K, T>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> IdentityCache<K, T>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                prune_at: MIN_PRUNE_THRESHOLD,
            }),
        }
    }

    /// Return the live instance for `key`, or construct, register and return
    /// a new one.
    ///
    /// `make` runs while the cache is locked and must not call back into the
    /// same cache.
    pub fn get_or_create<F>(&self, key: K, make: F) -> Arc<T>
    where
        F: FnOnce() -> Arc<T>,
    {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.map.get(&key).and_then(Weak::upgrade) {
            return existing;
        }

        if entries.map.len() >= entries.prune_at {
            entries.map.retain(|_, weak| weak.strong_count() > 0);
            entries.prune_at = (entries.map.len() * 2).max(MIN_PRUNE_THRESHOLD);
        }

        let instance = make();
        entries.map.insert(key, Arc::downgrade(&instance));
        instance
    }

    /// Live instance for `key`, without constructing one.
    pub fn get(&self, key: &K) -> Option<Arc<T>> {
        self.entries.lock().map.get(key).and_then(Weak::upgrade)
    }

    /// Snapshot of every live instance whose key satisfies `filter`.
    pub fn live_where<P>(&self, mut filter: P) -> Vec<Arc<T>>
    where
        P: FnMut(&K) -> bool,
    {
        let entries = self.entries.lock();
        entries
            .map
            .iter()
            .filter(|(key, _)| filter(key))
            .filter_map(|(_, weak)| weak.upgrade())
            .collect()
    }

    /// Number of live instances.
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .map
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

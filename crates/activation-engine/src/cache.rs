//! Per-tenant configuration cache
//!
//! Populated on first read per key and cleared only on explicit request.
//! Each key has its own slot mutex, so concurrent readers of a missing key
//! run the loader at most once while other keys stay unblocked.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

type Slot<T> = Arc<Mutex<Option<Arc<T>>>>;

/// Process-lifetime cache keyed by tenant
pub struct ConfigCache<T> {
    slots: DashMap<String, Slot<T>>,
}

impl<T> ConfigCache<T> {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    /// Cached value for `key`, running `loader` once if there is none
    pub fn get_or_populate<F>(&self, key: &str, loader: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        // Clone the slot out so the map shard is not held while loading
        let slot = self.slots.entry(key.to_string()).or_default().clone();

        let mut guard = slot.lock();
        if let Some(value) = guard.as_ref() {
            tracing::trace!(key, "Configuration cache hit");
            return Arc::clone(value);
        }

        tracing::debug!(key, "Configuration cache miss, populating");
        let value = Arc::new(loader());
        *guard = Some(Arc::clone(&value));
        value
    }

    /// Cached value for `key` without populating
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let slot = self.slots.get(key)?.clone();
        let guard = slot.lock();
        guard.clone()
    }

    pub fn invalidate(&self, key: &str) {
        if self.slots.remove(key).is_some() {
            tracing::debug!(key, "Configuration cache entry invalidated");
        }
    }

    pub fn invalidate_all(&self) {
        self.slots.clear();
        tracing::debug!("Configuration cache cleared");
    }

    /// Number of populated entries
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ConfigCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ConfigCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCache")
            .field("keys", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_populates_once_per_key() {
        let cache = ConfigCache::new();
        let loads = AtomicUsize::new(0);

        let first = cache.get_or_populate("site-1", || {
            loads.fetch_add(1, Ordering::SeqCst);
            "config".to_string()
        });
        let second = cache.get_or_populate("site-1", || {
            loads.fetch_add(1, Ordering::SeqCst);
            "other".to_string()
        });

        assert_eq!(*first, "config");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let cache = ConfigCache::new();
        cache.get_or_populate("a", || 1);
        cache.get_or_populate("b", || 2);

        cache.invalidate("a");
        assert!(cache.get("a").is_none());
        assert_eq!(cache.get("b").as_deref(), Some(&2));
        assert_eq!(*cache.get_or_populate("a", || 3), 3);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_populate_runs_loader_once() {
        let cache = Arc::new(ConfigCache::new());
        let loads = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let loads = Arc::clone(&loads);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_populate("tenant", || {
                        loads.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(std::time::Duration::from_millis(10));
                        42u32
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(*handle.join().unwrap(), 42);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}

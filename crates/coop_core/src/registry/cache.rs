//! Memoized registry construction.
//!
//! # Invariants
//! - At most one value is constructed per type, even under concurrent
//!   first access.
//! - Stored values are never mutated or replaced, only dropped by `clear`.

use log::debug;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Slot = Arc<dyn Any + Send + Sync>;

/// Type-keyed map of shared registries.
#[derive(Default)]
pub struct RegistryCache {
    entries: RwLock<HashMap<TypeId, Slot>>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached `V`, constructing it with `init` on first access.
    ///
    /// `init` runs under the write lock, so concurrent first callers observe
    /// one construction and share the same `Arc`.
    pub fn get_or_init<V, F>(&self, init: F) -> Arc<V>
    where
        V: Any + Send + Sync,
        F: FnOnce() -> V,
    {
        if let Some(existing) = self.get::<V>() {
            return existing;
        }

        let mut entries = self.write();
        if let Some(existing) = entries.get(&TypeId::of::<V>()).and_then(downcast::<V>) {
            return existing;
        }
        let created = Arc::new(init());
        entries.insert(TypeId::of::<V>(), created.clone() as Slot);
        debug!(
            "event=registry_cache_init module=registry status=ok type={} size={}",
            std::any::type_name::<V>(),
            entries.len()
        );
        created
    }

    pub fn get<V: Any + Send + Sync>(&self) -> Option<Arc<V>> {
        self.read()
            .get(&TypeId::of::<V>())
            .and_then(downcast::<V>)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drops every cached value. Outstanding `Arc`s stay valid.
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeId, Slot>> {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeId, Slot>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn downcast<V: Any + Send + Sync>(slot: &Slot) -> Option<Arc<V>> {
    slot.clone().downcast::<V>().ok()
}

#[cfg(test)]
mod tests {
    use super::RegistryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    struct Probe(usize);

    #[test]
    fn concurrent_first_access_constructs_once() {
        let cache = Arc::new(RegistryCache::new());
        let constructed = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(16));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let constructed = Arc::clone(&constructed);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache.get_or_init(|| Probe(constructed.fetch_add(1, Ordering::SeqCst)))
                })
            })
            .collect();
        let probes: Vec<Arc<Probe>> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert!(probes.iter().all(|probe| Arc::ptr_eq(probe, &probes[0])));
        assert_eq!(probes[0].0, 0);
    }

    #[test]
    fn clear_allows_fresh_construction() {
        let cache = RegistryCache::new();
        let first = cache.get_or_init(|| Probe(1));
        cache.clear();
        assert!(cache.is_empty());
        let second = cache.get_or_init(|| Probe(2));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}

//! Last known monitor topology, shared between the listener and readers.
//!
//! The cache owns both the snapshot and the native resource it was built
//! from. The resource is released exactly once: either when a newer
//! `replace` supersedes it, when `teardown` runs, or when the cache itself is
//! dropped, whichever comes first. After `teardown` the cache stays released
//! and refuses further writes.

use crate::display::TopologySnapshot;
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};

#[derive(Default)]
pub(crate) struct Slot {
    snapshot: Option<Arc<TopologySnapshot>>,
    resource: Option<Box<dyn Any + Send>>,
    released: bool,
}

/// Single-writer, many-reader topology cache.
#[derive(Default)]
pub struct TopologyCache {
    slot: Mutex<Slot>,
}

impl TopologyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, or `None` if nothing has been installed yet or
    /// the cache was torn down.
    ///
    /// Waits at most for one in-flight `replace` to finish.
    pub fn read(&self) -> Option<Arc<TopologySnapshot>> {
        self.lock().snapshot.clone()
    }

    /// Install a new snapshot together with its backing resource.
    ///
    /// The previous resource is released under the lock. Returns `false` and
    /// drops `resource` if the cache has already been torn down.
    pub fn replace(&self, snapshot: TopologySnapshot, resource: Box<dyn Any + Send>) -> bool {
        let mut slot = self.lock();
        if slot.released {
            drop(slot);
            log::debug!("topology cache already released, discarding update");
            return false;
        }

        slot.snapshot = Some(Arc::new(snapshot));
        slot.resource = Some(resource);
        true
    }

    /// Release the held resource and mark the cache empty.
    ///
    /// Never blocks. Returns `true` only for the call that actually released
    /// the resource; a busy lock or an already released cache is a no-op and
    /// leaves the release to whoever runs next.
    pub fn teardown(&self) -> bool {
        let mut slot = match self.slot.try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                log::debug!("topology cache busy, deferring teardown");
                return false;
            }
        };

        if slot.released {
            return false;
        }

        slot.released = true;
        slot.snapshot = None;
        slot.resource = None;
        true
    }

    /// Whether `teardown` has released the cache.
    pub fn is_released(&self) -> bool {
        self.lock().released
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn hold_lock(&self) -> MutexGuard<'_, Slot> {
        self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{DropCounter, record};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn snapshot(seed: i32) -> TopologySnapshot {
        let count = (seed % 5 + 1) as i64;
        let records = (0..count as i32).map(|i| record(i + 1, seed * 100 + i, seed, 10 + i, 20 + i));
        TopologySnapshot::from_records(count, records).unwrap()
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache = TopologyCache::new();
        assert!(cache.read().is_none());
        assert!(!cache.is_released());
    }

    #[test]
    fn test_replace_then_read() {
        let cache = TopologyCache::new();
        assert!(cache.replace(snapshot(3), Box::new(())));
        assert_eq!(cache.read().as_deref(), Some(&snapshot(3)));
    }

    #[test]
    fn test_replace_releases_previous_resource() {
        let counter = DropCounter::new();
        let cache = TopologyCache::new();

        cache.replace(snapshot(1), Box::new(counter.token()));
        assert_eq!(counter.drops(), 0);

        cache.replace(snapshot(2), Box::new(counter.token()));
        assert_eq!(counter.drops(), 1);

        drop(cache);
        assert_eq!(counter.drops(), 2);
    }

    #[test]
    fn test_teardown_releases_exactly_once() {
        let counter = DropCounter::new();
        let cache = TopologyCache::new();
        cache.replace(snapshot(1), Box::new(counter.token()));

        assert!(cache.teardown());
        assert!(!cache.teardown());
        drop(cache);

        assert_eq!(counter.drops(), 1);
    }

    #[test]
    fn test_replace_after_teardown_is_refused() {
        let counter = DropCounter::new();
        let cache = TopologyCache::new();
        cache.teardown();

        assert!(!cache.replace(snapshot(1), Box::new(counter.token())));
        assert_eq!(counter.drops(), 1);
        assert!(cache.read().is_none());
    }

    #[test]
    fn test_teardown_defers_when_lock_is_held() {
        let counter = DropCounter::new();
        let cache = TopologyCache::new();
        cache.replace(snapshot(1), Box::new(counter.token()));

        let guard = cache.hold_lock();
        assert!(!cache.teardown());
        drop(guard);

        assert_eq!(counter.drops(), 0);
        assert!(cache.read().is_some());
        assert!(cache.teardown());
        assert_eq!(counter.drops(), 1);
    }

    #[test]
    fn test_readers_never_observe_torn_snapshots() {
        const WRITES: i32 = 200;
        const READERS: usize = 4;

        let cache = Arc::new(TopologyCache::new());
        let installed: HashSet<Vec<_>> = (0..WRITES)
            .map(|seed| snapshot(seed).monitors().to_vec())
            .collect();
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let cache = cache.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let mut observed = Vec::new();
                    while !done.load(Ordering::SeqCst) {
                        if let Some(snapshot) = cache.read() {
                            observed.push(snapshot);
                        }
                    }
                    observed
                })
            })
            .collect();

        for seed in 0..WRITES {
            cache.replace(snapshot(seed), Box::new(seed));
        }
        done.store(true, Ordering::SeqCst);

        for reader in readers {
            for observed in reader.join().unwrap() {
                assert_eq!(usize::from(observed.count()), observed.monitors().len());
                assert!(installed.contains(observed.monitors()));
            }
        }
    }
}

//! A concurrent loading cache with time-based expiry.
//!
//! Loads are single-flight per key: the loader runs while the key's shard
//! is locked, so concurrent callers for the same key wait for one load
//! instead of racing. A failed load leaves nothing behind.

use std::hash::Hash;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// When an entry stops being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Expire once the entry has not been read or written for this long.
    AfterAccess(Duration),
    /// Expire this long after the entry was loaded.
    AfterWrite(Duration),
}

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    written: Instant,
    accessed: Instant,
}

impl<V> Slot<V> {
    const fn new(value: V, now: Instant) -> Self {
        Self {
            value,
            written: now,
            accessed: now,
        }
    }

    fn is_expired(&self, expiry: Expiry, now: Instant) -> bool {
        match expiry {
            Expiry::AfterAccess(ttl) => now.saturating_duration_since(self.accessed) >= ttl,
            Expiry::AfterWrite(ttl) => now.saturating_duration_since(self.written) >= ttl,
        }
    }
}

/// A map whose entries are loaded on demand and expire on their own.
///
/// Every operation takes the current [`Instant`] explicitly so callers
/// (and tests) control the clock.
pub struct LoadingCache<K, V> {
    map: DashMap<K, Slot<V>>,
    expiry: Expiry,
    max_entries: Option<usize>,
}

impl<K, V> core::fmt::Debug for LoadingCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoadingCache")
            .field("len", &self.map.len())
            .field("expiry", &self.expiry)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl<K, V> LoadingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// An unbounded cache.
    pub fn new(expiry: Expiry) -> Self {
        Self {
            map: DashMap::new(),
            expiry,
            max_entries: None,
        }
    }

    /// Bound the number of entries. When a load pushes the cache over the
    /// bound, expired entries go first, then the oldest loaded.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// The live value for `key`, without loading.
    pub fn get_if_present(&self, key: &K, now: Instant) -> Option<V> {
        let mut slot = self.map.get_mut(key)?;
        if slot.is_expired(self.expiry, now) {
            drop(slot);
            self.map.remove_if(key, |_, s| s.is_expired(self.expiry, now));
            return None;
        }
        slot.accessed = now;
        Some(slot.value.clone())
    }

    /// The live value for `key`, loading it with `load` if absent or
    /// expired.
    ///
    /// `load` must not touch this cache.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, now: Instant, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let value = match self.map.entry(key) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_expired(self.expiry, now) {
                    let slot = occupied.get_mut();
                    slot.accessed = now;
                    return Ok(slot.value.clone());
                }
                match load() {
                    Ok(value) => {
                        occupied.insert(Slot::new(value.clone(), now));
                        value
                    }
                    Err(error) => {
                        occupied.remove();
                        return Err(error);
                    }
                }
            }
            Entry::Vacant(vacant) => {
                let value = load()?;
                vacant.insert(Slot::new(value.clone(), now));
                value
            }
        };
        self.evict(now);
        Ok(value)
    }

    /// Store a value directly.
    pub fn insert(&self, key: K, value: V, now: Instant) {
        self.map.insert(key, Slot::new(value, now));
        self.evict(now);
    }

    /// Drop one entry, returning its value.
    pub fn invalidate(&self, key: &K) -> Option<V> {
        self.map.remove(key).map(|(_, slot)| slot.value)
    }

    /// Drop every entry whose key matches.
    pub fn invalidate_where(&self, predicate: impl Fn(&K) -> bool) {
        self.map.retain(|key, _| !predicate(key));
    }

    /// Drop everything.
    pub fn invalidate_all(&self) {
        self.map.clear();
    }

    /// Drop expired entries and return how many went.
    pub fn cleanup(&self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, slot| !slot.is_expired(self.expiry, now));
        before.saturating_sub(self.map.len())
    }

    /// A snapshot of every stored value, expired or not.
    pub fn values(&self) -> Vec<V> {
        self.map.iter().map(|entry| entry.value().value.clone()).collect()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn evict(&self, now: Instant) {
        let Some(max) = self.max_entries else {
            return;
        };
        if self.map.len() <= max {
            return;
        }
        self.map.retain(|_, slot| !slot.is_expired(self.expiry, now));
        while self.map.len() > max {
            let oldest = self
                .map
                .iter()
                .min_by_key(|entry| entry.value().written)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else {
                break;
            };
            self.map.remove(&oldest);
        }
    }
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    #[test]
    fn loads_once_until_expired() {
        let cache = LoadingCache::new(Expiry::AfterWrite(TTL));
        let loads = AtomicUsize::new(0);
        let start = Instant::now();
        let load = || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ()>(7)
        };

        assert_eq!(cache.get_or_try_insert_with("k", start, load), Ok(7));
        assert_eq!(cache.get_or_try_insert_with("k", start + Duration::from_secs(5), load), Ok(7));
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        assert_eq!(cache.get_or_try_insert_with("k", start + TTL, load), Ok(7));
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn access_extends_after_access_entries() {
        let cache = LoadingCache::new(Expiry::AfterAccess(TTL));
        let start = Instant::now();
        cache.insert(1, "a", start);
        let later = start + Duration::from_secs(8);
        assert_eq!(cache.get_if_present(&1, later), Some("a"));
        assert_eq!(cache.get_if_present(&1, later + Duration::from_secs(8)), Some("a"));
        assert_eq!(cache.get_if_present(&1, later + Duration::from_secs(30)), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache: LoadingCache<u8, u8> = LoadingCache::new(Expiry::AfterWrite(TTL));
        let now = Instant::now();
        assert_eq!(cache.get_or_try_insert_with(1, now, || Err("offline")), Err("offline"));
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_try_insert_with(1, now, || Ok::<_, &str>(3)), Ok(3));
    }

    #[test]
    fn failed_reload_drops_the_stale_entry() {
        let cache: LoadingCache<u8, u8> = LoadingCache::new(Expiry::AfterWrite(TTL));
        let start = Instant::now();
        cache.insert(1, 1, start);
        let result = cache.get_or_try_insert_with(1, start + TTL, || Err(()));
        assert_eq!(result, Err(()));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn bound_evicts_oldest_first() {
        let cache = LoadingCache::new(Expiry::AfterWrite(TTL)).with_max_entries(2);
        let start = Instant::now();
        cache.insert("a", 1, start);
        cache.insert("b", 2, start + Duration::from_secs(1));
        cache.insert("c", 3, start + Duration::from_secs(2));
        let now = start + Duration::from_secs(3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_if_present(&"a", now), None);
        assert_eq!(cache.get_if_present(&"c", now), Some(3));
    }

    #[test]
    fn cleanup_counts_expired_entries() {
        let cache = LoadingCache::new(Expiry::AfterWrite(TTL));
        let start = Instant::now();
        cache.insert(1, (), start);
        cache.insert(2, (), start + Duration::from_secs(5));
        assert_eq!(cache.cleanup(start + TTL), 1);
        assert_eq!(cache.len(), 1);
        cache.invalidate_where(|k| *k == 2);
        assert!(cache.is_empty());
    }
}

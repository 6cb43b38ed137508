//! In-memory key/value cache with a TTL chosen per entry.
//!
//! Expiry is evaluated on access: an entry past its TTL reads as a miss even if
//! the background maintenance has not evicted it yet.

use moka::Expiry;
use moka::sync::Cache;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Stamped<V> {
    value: V,
    ttl: Duration,
}

/// Expiry policy reading the TTL stored alongside each value.
struct PerEntryTtl;

impl<K, V> Expiry<K, Stamped<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &K,
        value: &Stamped<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    // A replacement starts a fresh TTL instead of inheriting the old deadline.
    fn expire_after_update(
        &self,
        _key: &K,
        value: &Stamped<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-wide TTL cache. Clones share the same storage.
///
/// Reads never block each other; [`TtlCache::set`] swaps the whole value in
/// one step so readers see either the old or the new entry.
#[derive(Clone)]
pub struct TtlCache<K, V> {
    entries: Cache<K, Stamped<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    const DEFAULT_CAPACITY: u64 = 1_024;

    /// Creates an empty cache with the default capacity.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty cache bounded to `capacity` entries.
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Returns the live value for `key`, or `None` if absent or expired.
    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|stamped| stamped.value)
    }

    /// Stores `value` under `key`, replacing any previous entry, for `ttl`.
    #[inline]
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.entries.insert(key, Stamped { value, ttl });
    }

    /// Removes an entry, returning its value if it was still live.
    #[inline]
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|stamped| stamped.value)
    }

    /// Returns `true` if a live entry exists for `key`.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Approximate number of stored entries (see [`TtlCache::run_pending_tasks`]).
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    /// Drops every entry.
    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Runs pending maintenance so `len` reflects evictions and expirations.
    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

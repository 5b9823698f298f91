/*!
 * Expiring Cache
 * Mutex-protected key/value store with per-entry TTL and lazy eviction
 */

use super::clock::{Clock, SystemClock};
use crate::core::sync::atomic::AtomicCell;
use crate::core::sync::config::CacheConfig;
use crate::core::sync::locks::Mutex;
use ahash::RandomState;
use serde::Serialize;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Cached value with its insertion time and lifetime
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    /// Expired once `ttl` has fully elapsed; a zero TTL is expired immediately
    #[inline]
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

/// Outcome of a lookup, resolved inside the critical section
enum Lookup<V> {
    Hit(V),
    Expired,
    Miss,
}

/// Key/value cache with per-entry time-to-live
///
/// All map state sits behind one [`Mutex`]; counters are separate
/// [`AtomicCell`]s updated outside the critical section.
///
/// # Eviction
///
/// Eviction is lazy. An expired entry is removed by the next `get`,
/// `contains_key` or `remove` that touches it, by `clear`, or by an explicit
/// `purge_expired`. No background thread ever sweeps the map.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use sync_core::ExpiringCache;
///
/// let cache = ExpiringCache::new();
/// cache.set("theme", "dark", Duration::from_secs(60));
/// assert_eq!(cache.get("theme"), Some("dark"));
/// assert_eq!(cache.stats().total_accesses, 1);
/// ```
pub struct ExpiringCache<K, V, C = SystemClock> {
    entries: Mutex<HashMap<K, Entry<V>, RandomState>>,
    accesses: AtomicCell<u64>,
    misses: AtomicCell<u64>,
    expirations: AtomicCell<u64>,
    config: CacheConfig,
    clock: C,
}

impl<K: Hash + Eq, V> ExpiringCache<K, V> {
    /// Create a cache with the default configuration and system clock
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with `config` and the system clock
    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<K: Hash + Eq, V> Default for ExpiringCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, C: Clock> ExpiringCache<K, V, C> {
    /// Create a cache reading time from `clock`
    pub fn with_clock(config: CacheConfig, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_capacity_and_hasher(
                config.initial_capacity,
                RandomState::new(),
            )),
            accesses: AtomicCell::new(0),
            misses: AtomicCell::new(0),
            expirations: AtomicCell::new(0),
            config,
            clock,
        }
    }

    /// Look up a live value
    ///
    /// An expired entry is removed and reported as absent. Every call that
    /// returns a value increments `total_accesses` exactly once.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let lookup = self.entries.with_lock(|map| {
            let now = self.clock.now();
            let state = map
                .get(key)
                .map(|entry| (!entry.is_expired(now)).then(|| entry.value.clone()));

            match state {
                None => Lookup::Miss,
                Some(None) => {
                    map.remove(key);
                    Lookup::Expired
                }
                Some(Some(value)) => Lookup::Hit(value),
            }
        });

        match lookup {
            Lookup::Hit(value) => {
                self.accesses.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            Lookup::Expired => {
                trace!("Evicted expired cache entry on lookup");
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite `key`, restarting its TTL clock
    ///
    /// Succeeds regardless of whether a prior entry was live or expired.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.entries.with_lock(|map| {
            let inserted_at = self.clock.now();
            map.insert(
                key,
                Entry {
                    value,
                    inserted_at,
                    ttl,
                },
            );
        });
    }

    /// Insert with the configured default TTL
    pub fn set_default(&self, key: K, value: V) {
        self.set(key, value, self.config.default_ttl);
    }

    /// Remove `key`, returning its value if it was still live
    ///
    /// Removing an expired entry counts as an expiration, as in `get`.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let lookup = self.entries.with_lock(|map| {
            let now = self.clock.now();
            match map.remove(key) {
                None => Lookup::Miss,
                Some(entry) if entry.is_expired(now) => Lookup::Expired,
                Some(entry) => Lookup::Hit(entry.value),
            }
        });

        match lookup {
            Lookup::Hit(value) => Some(value),
            Lookup::Expired => {
                self.expirations.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Miss => None,
        }
    }

    /// Whether a live entry exists; evicts it if expired
    ///
    /// Does not count as an access.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (live, evicted) = self.entries.with_lock(|map| {
            let now = self.clock.now();
            match map.get(key).map(|entry| entry.is_expired(now)) {
                None => (false, false),
                Some(false) => (true, false),
                Some(true) => {
                    map.remove(key);
                    (false, true)
                }
            }
        });

        if evicted {
            self.expirations.fetch_add(1, Ordering::Relaxed);
        }
        live
    }

    /// Remove every expired entry now, returning how many were dropped
    ///
    /// Caller-driven; the cache never schedules this itself.
    pub fn purge_expired(&self) -> usize {
        let removed = self.entries.with_lock(|map| {
            let now = self.clock.now();
            let before = map.len();
            map.retain(|_, entry| !entry.is_expired(now));
            before - map.len()
        });

        if removed > 0 {
            self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Remove all entries
    pub fn clear(&self) {
        let removed = self.entries.with_lock(|map| {
            let removed = map.len();
            map.clear();
            removed
        });
        debug!(removed, "Cleared cache");
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.with_lock(|map| map.len())
    }

    /// Whether no entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Snapshot of size and counters
    ///
    /// `entries` is read under the lock and each counter atomically, but
    /// the fields are not one joint snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            total_accesses: self.accesses.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    /// `get` calls that returned a live value
    pub total_accesses: u64,
    pub misses: u64,
    pub expirations: u64,
}

impl CacheStats {
    /// Percentage of lookups that hit, 0.0 when nothing was looked up
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses + self.misses;
        if total > 0 {
            (self.total_accesses as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

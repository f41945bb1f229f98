//! LFU Cache Module
//!
//! Thread-safe cache handle: shared lock over [`LfuStore`], lock-free
//! counters, the eviction callback and the owned expiry sweeper.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::cache::store::{LfuStore, Lookup};
use crate::cache::{CacheStats, StatsCounters};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{spawn_sweeper, Sweeper, SweeperState};

/// Invoked with the removed key and value on every eviction or expiry.
pub type EvictionCallback<K, V> = Arc<dyn Fn(K, V) + Send + Sync>;

// == Cache Core ==
/// State shared between the cache handle and its sweeper task.
pub(crate) struct CacheCore<K, V> {
    store: RwLock<LfuStore<K, V>>,
    counters: StatsCounters,
    on_evict: Option<EvictionCallback<K, V>>,
}

impl<K, V> CacheCore<K, V>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new(capacity: usize, ttl: Duration, on_evict: Option<EvictionCallback<K, V>>) -> Self {
        Self {
            store: RwLock::new(LfuStore::new(capacity, ttl)),
            counters: StatsCounters::new(),
            on_evict,
        }
    }

    // == Sweep Expired ==
    /// Removes every expired entry under the write lock.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn sweep_expired(&self) -> usize {
        let mut store = self.store.write();
        let removed = store.remove_expired(Utc::now());
        let count = removed.len();
        for (key, value) in removed {
            self.notify_eviction(key, value);
        }
        count
    }

    /// Counts a removal and runs the callback. Caller holds the write lock.
    fn notify_eviction(&self, key: K, value: V) {
        self.counters.record_eviction();
        if let Some(on_evict) = &self.on_evict {
            on_evict(key, value);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.store.read().len()
    }

    #[cfg(test)]
    pub(crate) fn insert(&self, key: K, value: V) {
        self.store.write().insert(key, value, Utc::now());
    }

    #[cfg(test)]
    pub(crate) fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

// == LFU Cache ==
/// Bounded key-value cache with LFU eviction and TTL expiry.
///
/// - `get`/`set` are O(1) on average.
/// - Among the least frequently used entries, the least recently touched one
///   is evicted first.
/// - Entries expire `ttl` after their last `set`. Expired entries are removed
///   lazily by `get` and eagerly by a background sweeper that runs every
///   `cleanup_interval` until [`LfuCache::stop`] is called or the cache is
///   dropped.
///
/// # Key contract
/// `K`'s `Hash` and `Eq` (and those of any borrowed form `Q` passed to
/// [`LfuCache::get`]) must agree: equal keys must hash equally.
///
/// # Eviction callback contract
/// The callback runs synchronously while the cache's write lock is held. It
/// must not call back into the same cache, or it will deadlock.
pub struct LfuCache<K, V> {
    core: Arc<CacheCore<K, V>>,
    sweeper: Sweeper,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its sweeper on the current Tokio runtime.
    ///
    /// # Errors
    /// - [`CacheError::RuntimeUnavailable`] when called outside a runtime
    /// - [`CacheError::InvalidConfig`] when `cleanup_interval` is zero
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Like [`LfuCache::new`], with a callback run on every removal.
    pub fn with_eviction_callback<F>(config: CacheConfig, on_evict: F) -> Result<Self>
    where
        F: Fn(K, V) + Send + Sync + 'static,
    {
        Self::build(config, Some(Arc::new(on_evict)))
    }

    fn build(config: CacheConfig, on_evict: Option<EvictionCallback<K, V>>) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| CacheError::RuntimeUnavailable)?;

        let core = Arc::new(CacheCore::new(config.capacity, config.ttl, on_evict));
        let sweeper = spawn_sweeper(Arc::downgrade(&core), config.cleanup_interval, &runtime);

        info!(
            "LFU cache created: capacity={}, ttl={:?}, cleanup_interval={:?}",
            config.capacity, config.ttl, config.cleanup_interval
        );
        Ok(Self { core, sweeper })
    }

    // == Get ==
    /// Retrieves a value and counts the access towards its frequency.
    ///
    /// Returns None if the key is absent or expired. An expired entry is
    /// removed on the spot, counted as an eviction and passed to the callback.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Plain misses never wait for the write lock
        let present = self.core.store.read().contains_key(key);
        if !present {
            self.core.counters.record_miss();
            return None;
        }

        let mut store = self.core.store.write();
        match store.access(key, Utc::now()) {
            Lookup::Hit(value) => {
                self.core.counters.record_hit();
                Some(value)
            }
            Lookup::Expired(key, value) => {
                debug!("Lazily expired entry on lookup");
                self.core.notify_eviction(key, value);
                self.core.counters.record_miss();
                None
            }
            Lookup::Missing => {
                self.core.counters.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts or updates a key-value pair.
    ///
    /// Updating keeps the entry's frequency and promotes it once; the TTL
    /// restarts. Inserting into a full cache evicts the least frequently used
    /// entry first. No-op when capacity is 0.
    pub fn set(&self, key: K, value: V) {
        let mut store = self.core.store.write();
        if let Some((evicted_key, evicted_value)) = store.insert(key, value, Utc::now()) {
            debug!("Evicted least frequently used entry");
            self.core.notify_eviction(evicted_key, evicted_value);
        }
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.core.store.read().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.core.store.read().is_empty()
    }

    // == Capacity ==
    pub fn capacity(&self) -> usize {
        self.core.store.read().capacity()
    }

    // == Stats ==
    /// Returns the hit/miss/eviction counters without taking the cache lock.
    pub fn stats(&self) -> CacheStats {
        self.core.counters.snapshot()
    }

    // == Purge Expired ==
    /// Runs one sweeper pass now.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.core.sweep_expired()
    }

    // == Stop ==
    /// Stops the background sweeper. Lazy expiry on `get` keeps working.
    ///
    /// Returns false if the sweeper was already stopped.
    pub fn stop(&self) -> bool {
        self.sweeper.stop()
    }

    // == Sweeper State ==
    pub fn sweeper_state(&self) -> SweeperState {
        self.sweeper.state()
    }

    /// Handle to the background sweeper task.
    pub fn sweeper(&self) -> &Sweeper {
        &self.sweeper
    }
}

impl<K, V> fmt::Debug for LfuCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCache")
            .field("stats", &self.core.counters.snapshot())
            .field("sweeper", &self.sweeper)
            .finish_non_exhaustive()
    }
}

// Dropping the cache drops the sweeper's shutdown sender, which ends the task.

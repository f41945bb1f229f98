//! Cache Store Module
//!
//! Single-threaded LFU engine: key table, entry arena and frequency index.
//! [`crate::cache::LfuCache`] wraps it in a lock and adds counters and the
//! eviction callback.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::entry::ttl_delta;
use crate::cache::{CacheEntry, FrequencyIndex, SlotArena, SlotId};

// == Lookup Outcome ==
/// Result of [`LfuStore::access`].
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<K, V> {
    /// Live entry; its frequency has been promoted
    Hit(V),
    /// Entry had reached its TTL and was removed
    Expired(K, V),
    /// No entry for the key
    Missing,
}

// == LFU Store ==
/// LFU storage with recency tie-break and TTL expiry.
///
/// Every removal hands the removed `(key, value)` back to the caller so the
/// caller can count it and run the eviction callback.
#[derive(Debug)]
pub struct LfuStore<K, V> {
    /// Key -> arena slot
    keys: HashMap<K, SlotId>,
    /// Owns every live entry
    entries: SlotArena<CacheEntry<K, V>>,
    /// Frequency buckets and min_frequency
    index: FrequencyIndex,
    /// Maximum number of entries allowed
    capacity: usize,
    /// Age at which an entry expires
    ttl: TimeDelta,
}

impl<K, V> LfuStore<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries; 0 disables all inserts
    /// * `ttl` - Age at which an entry expires
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            keys: HashMap::new(),
            entries: SlotArena::new(),
            index: FrequencyIndex::new(),
            capacity,
            ttl: ttl_delta(ttl),
        }
    }

    // == Contains ==
    /// Cheap presence check that ignores expiry and does not touch frequency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.keys.contains_key(key)
    }

    // == Access ==
    /// Looks a key up as an LFU access.
    ///
    /// A live entry is promoted to the next frequency. An entry that has
    /// reached its TTL is removed and returned as [`Lookup::Expired`].
    pub fn access<Q>(&mut self, key: &Q, now: DateTime<Utc>) -> Lookup<K, V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let Some(&id) = self.keys.get(key) else {
            return Lookup::Missing;
        };
        let expired = match self.entries.get(id) {
            Some(entry) => entry.is_expired(now, self.ttl),
            None => return Lookup::Missing,
        };

        if expired {
            return match self.remove_slot(id) {
                Some((key, value)) => Lookup::Expired(key, value),
                None => Lookup::Missing,
            };
        }

        self.index.promote(&mut self.entries, id);
        match self.entries.get(id) {
            Some(entry) => Lookup::Hit(entry.value.clone()),
            None => Lookup::Missing,
        }
    }

    // == Insert ==
    /// Stores a key-value pair.
    ///
    /// An existing key gets the new value, a fresh TTL and a frequency
    /// promotion (an overwrite counts as an access). A new key entering a
    /// full store first evicts the least frequently used entry, which is
    /// returned. With capacity 0 this is a no-op.
    pub fn insert(&mut self, key: K, value: V, now: DateTime<Utc>) -> Option<(K, V)> {
        if self.capacity == 0 {
            return None;
        }

        if let Some(&id) = self.keys.get(&key) {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.refresh(value, now);
            }
            self.index.promote(&mut self.entries, id);
            return None;
        }

        let evicted = if self.entries.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let id = self
            .entries
            .insert(CacheEntry::new(key.clone(), value, now));
        self.keys.insert(key, id);
        self.index.insert(&mut self.entries, id);

        evicted
    }

    // == Evict ==
    /// Removes the least frequently used entry, breaking ties by evicting the
    /// least recently touched one.
    ///
    /// Returns None if the store is empty.
    pub fn evict(&mut self) -> Option<(K, V)> {
        let id = self.index.pop_least_frequent(&mut self.entries)?;
        let entry = self.entries.remove(id)?;
        self.keys.remove(&entry.key);
        Some((entry.key, entry.value))
    }

    // == Remove Expired ==
    /// Removes every entry that has reached its TTL. Full O(len) pass.
    ///
    /// Returns the removed pairs.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> Vec<(K, V)> {
        let ttl = self.ttl;
        let expired: Vec<SlotId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, ttl))
            .map(|(id, _)| id)
            .collect();

        expired
            .into_iter()
            .filter_map(|id| self.remove_slot(id))
            .collect()
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    // == Capacity ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current access count of a key, if present.
    #[cfg(test)]
    pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.keys.get(key)?;
        self.entries.get(*id).map(|entry| entry.frequency)
    }

    /// Panics if the key table, arena and frequency index disagree.
    #[cfg(test)]
    pub fn assert_invariants(&self) {
        assert!(self.len() <= self.capacity, "size exceeds capacity");
        assert_eq!(self.keys.len(), self.entries.len(), "key table and arena differ");

        let mut per_frequency: HashMap<u64, usize> = HashMap::new();
        for (id, entry) in self.entries.iter() {
            assert_eq!(self.keys.get(&entry.key), Some(&id), "key maps to wrong slot");
            *per_frequency.entry(entry.frequency).or_default() += 1;
        }

        assert_eq!(self.index.bucket_count(), per_frequency.len(), "empty bucket kept alive");
        for (frequency, count) in &per_frequency {
            assert_eq!(self.index.bucket_len(*frequency), *count, "bucket {} size", frequency);
        }
        if let Some(true_min) = per_frequency.keys().min() {
            assert!(self.index.min_frequency() <= *true_min, "min_frequency overstated");
        }
    }

    /// Unlinks and frees a slot without choosing it by frequency.
    fn remove_slot(&mut self, id: SlotId) -> Option<(K, V)> {
        self.index.remove(&mut self.entries, id);
        let entry = self.entries.remove(id)?;
        self.keys.remove(&entry.key);
        Some((entry.key, entry.value))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::entry::at_ms;

    const MINUTE: Duration = Duration::from_secs(60);

    fn store(capacity: usize) -> LfuStore<String, i32> {
        LfuStore::new(capacity, MINUTE)
    }

    fn hit(value: i32) -> Lookup<String, i32> {
        Lookup::Hit(value)
    }

    #[test]
    fn test_store_new() {
        let store = store(10);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.capacity(), 10);
    }

    #[test]
    fn test_store_insert_and_access() {
        let mut store = store(10);

        assert_eq!(store.insert("a".to_string(), 1, at_ms(0)), None);
        assert_eq!(store.access("a", at_ms(0)), hit(1));
        assert_eq!(store.frequency("a"), Some(2));
        assert_eq!(store.len(), 1);
        store.assert_invariants();
    }

    #[test]
    fn test_store_access_missing() {
        let mut store = store(10);
        assert_eq!(store.access("nope", at_ms(0)), Lookup::Missing);
    }

    #[test]
    fn test_store_overwrite_promotes_and_keeps_single_entry() {
        let mut store = store(10);

        store.insert("a".to_string(), 1, at_ms(0));
        store.insert("a".to_string(), 2, at_ms(10));

        assert_eq!(store.len(), 1);
        assert_eq!(store.frequency("a"), Some(2));
        assert_eq!(store.access("a", at_ms(10)), hit(2));
        store.assert_invariants();
    }

    #[test]
    fn test_store_evicts_least_frequent() {
        let mut store = store(2);

        store.insert("a".to_string(), 1, at_ms(0));
        store.insert("b".to_string(), 2, at_ms(0));
        store.access("a", at_ms(0));

        let evicted = store.insert("c".to_string(), 3, at_ms(0));

        assert_eq!(evicted, Some(("b".to_string(), 2)));
        assert!(store.contains_key("a"));
        assert!(store.contains_key("c"));
        assert_eq!(store.len(), 2);
        store.assert_invariants();
    }

    #[test]
    fn test_store_tie_breaks_by_recency() {
        let mut store = store(3);

        store.insert("a".to_string(), 1, at_ms(0));
        store.insert("b".to_string(), 2, at_ms(0));
        store.insert("c".to_string(), 3, at_ms(0));
        // All at frequency 2; 'b' was promoted first so it is the oldest
        store.access("b", at_ms(0));
        store.access("a", at_ms(0));
        store.access("c", at_ms(0));

        let evicted = store.insert("d".to_string(), 4, at_ms(0));
        assert_eq!(evicted, Some(("b".to_string(), 2)));
        assert_eq!(store.len(), 3);
        // 'd' now sits alone at frequency 1
        assert_eq!(store.evict(), Some(("d".to_string(), 4)));
        assert_eq!(store.evict(), Some(("a".to_string(), 1)));
        assert_eq!(store.evict(), Some(("c".to_string(), 3)));
        assert_eq!(store.evict(), None);
    }

    #[test]
    fn test_store_zero_capacity_is_noop() {
        let mut store = store(0);

        assert_eq!(store.insert("a".to_string(), 1, at_ms(0)), None);
        assert!(store.is_empty());
        assert_eq!(store.access("a", at_ms(0)), Lookup::Missing);
    }

    #[test]
    fn test_store_lazy_expiry() {
        let mut store = LfuStore::new(10, Duration::from_millis(50));

        store.insert("x".to_string(), 42, at_ms(1_000));

        assert_eq!(store.access("x", at_ms(1_049)), hit(42));
        assert_eq!(
            store.access("x", at_ms(1_050)),
            Lookup::Expired("x".to_string(), 42)
        );
        assert!(store.is_empty());
        assert_eq!(store.access("x", at_ms(1_050)), Lookup::Missing);
        store.assert_invariants();
    }

    #[test]
    fn test_store_sub_millisecond_ttl() {
        let mut store = LfuStore::new(10, Duration::from_micros(900));
        let start = at_ms(1_000);

        store.insert("x".to_string(), 7, start);

        assert_eq!(store.access("x", start + TimeDelta::microseconds(21)), hit(7));
        assert_eq!(
            store.access("x", start + TimeDelta::microseconds(900)),
            Lookup::Expired("x".to_string(), 7)
        );
        store.assert_invariants();
    }

    #[test]
    fn test_store_fractional_millisecond_ttl() {
        let mut store = LfuStore::new(10, Duration::from_micros(5_500));
        let start = at_ms(1_000);

        store.insert("x".to_string(), 7, start);
        store.insert("y".to_string(), 8, start);

        assert_eq!(store.access("x", start + TimeDelta::microseconds(5_400)), hit(7));
        assert!(store.remove_expired(start + TimeDelta::microseconds(5_499)).is_empty());
        assert_eq!(
            store.remove_expired(start + TimeDelta::microseconds(5_500)).len(),
            2
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_overwrite_resets_ttl() {
        let mut store = LfuStore::new(10, Duration::from_millis(50));

        store.insert("x".to_string(), 1, at_ms(1_000));
        store.insert("x".to_string(), 2, at_ms(1_040));

        assert_eq!(store.access("x", at_ms(1_080)), hit(2));
    }

    #[test]
    fn test_store_remove_expired() {
        let mut store = LfuStore::new(10, Duration::from_millis(50));

        store.insert("old1".to_string(), 1, at_ms(1_000));
        store.insert("old2".to_string(), 2, at_ms(1_000));
        store.insert("fresh".to_string(), 3, at_ms(1_040));

        let mut removed = store.remove_expired(at_ms(1_060));
        removed.sort();

        assert_eq!(removed, vec![("old1".to_string(), 1), ("old2".to_string(), 2)]);
        assert_eq!(store.len(), 1);
        assert!(store.contains_key("fresh"));
        store.assert_invariants();
    }

    #[test]
    fn test_store_expiry_of_min_bucket_then_capacity_eviction() {
        let mut store = LfuStore::new(2, Duration::from_millis(50));

        store.insert("old".to_string(), 1, at_ms(1_000));
        store.insert("hot".to_string(), 2, at_ms(1_040));
        store.access("hot", at_ms(1_040));
        store.access("hot", at_ms(1_040));

        // Only frequency-1 entry expires, leaving min_frequency stale
        assert_eq!(store.remove_expired(at_ms(1_060)).len(), 1);
        store.assert_invariants();

        store.insert("new".to_string(), 3, at_ms(1_060));
        let evicted = store.insert("newer".to_string(), 4, at_ms(1_060));
        assert_eq!(evicted, Some(("new".to_string(), 3)));
        assert_eq!(store.frequency("hot"), Some(3));
        store.assert_invariants();
    }
}

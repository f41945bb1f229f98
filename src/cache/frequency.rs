//! Frequency Index Module
//!
//! Routes entries to the bucket matching their access count and tracks the
//! lowest populated frequency for O(1) eviction.

use std::collections::HashMap;

use crate::cache::{CacheEntry, FrequencyBucket, SlotArena, SlotId};

// == Frequency Index ==
/// Maps frequency -> bucket, plus `min_frequency`.
///
/// Buckets are created lazily and dropped as soon as they empty.
///
/// `min_frequency` is allowed to be stale-low after a deletion (it may name a
/// bucket that no longer exists) but never stale-high. Inserting a new key
/// resets it to 1; [`FrequencyIndex::pop_least_frequent`] repairs a stale value
/// before choosing a victim.
#[derive(Debug, Default)]
pub struct FrequencyIndex {
    buckets: HashMap<u64, FrequencyBucket>,
    min_frequency: u64,
}

impl FrequencyIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Files a brand-new entry under frequency 1.
    pub fn insert<K, V>(&mut self, entries: &mut SlotArena<CacheEntry<K, V>>, id: SlotId) {
        if let Some(entry) = entries.get_mut(id) {
            entry.frequency = 1;
        }
        self.buckets
            .entry(1)
            .or_insert_with(FrequencyBucket::new)
            .push_front(entries, id);
        self.min_frequency = 1;
    }

    // == Promote ==
    /// Moves an entry from bucket `f` to the front of bucket `f + 1`.
    ///
    /// Returns the new frequency, or None if the handle is dead.
    pub fn promote<K, V>(&mut self, entries: &mut SlotArena<CacheEntry<K, V>>, id: SlotId) -> Option<u64> {
        let old_frequency = entries.get(id)?.frequency;
        let new_frequency = old_frequency.saturating_add(1);

        if self.detach_from(entries, id, old_frequency) && self.min_frequency == old_frequency {
            self.min_frequency = new_frequency;
        }

        if let Some(entry) = entries.get_mut(id) {
            entry.frequency = new_frequency;
        }
        self.buckets
            .entry(new_frequency)
            .or_insert_with(FrequencyBucket::new)
            .push_front(entries, id);
        Some(new_frequency)
    }

    // == Remove ==
    /// Unlinks an entry that is being deleted for a reason other than LFU
    /// pressure (TTL expiry). `min_frequency` is left as is.
    pub fn remove<K, V>(&mut self, entries: &mut SlotArena<CacheEntry<K, V>>, id: SlotId) {
        if let Some(frequency) = entries.get(id).map(|e| e.frequency) {
            self.detach_from(entries, id, frequency);
        }
    }

    // == Pop Least Frequent ==
    /// Detaches the eviction candidate: the least recently touched entry of
    /// the lowest populated frequency.
    ///
    /// Returns None if no bucket exists.
    pub fn pop_least_frequent<K, V>(&mut self, entries: &mut SlotArena<CacheEntry<K, V>>) -> Option<SlotId> {
        if !self.buckets.contains_key(&self.min_frequency) {
            // Stale after a TTL deletion emptied the minimum bucket
            self.min_frequency = self.buckets.keys().copied().min()?;
        }

        let frequency = self.min_frequency;
        let bucket = self.buckets.get_mut(&frequency)?;
        let victim = bucket.remove_oldest(entries)?;
        if bucket.is_empty() {
            self.buckets.remove(&frequency);
        }
        Some(victim)
    }

    // == Min Frequency ==
    /// The recorded minimum. May name an already dropped bucket.
    #[cfg(test)]
    pub fn min_frequency(&self) -> u64 {
        self.min_frequency
    }

    // == Bucket Count ==
    #[cfg(test)]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of entries filed under `frequency`.
    #[cfg(test)]
    pub fn bucket_len(&self, frequency: u64) -> usize {
        self.buckets.get(&frequency).map_or(0, FrequencyBucket::len)
    }

    /// Returns true if the bucket emptied and was dropped.
    fn detach_from<K, V>(
        &mut self,
        entries: &mut SlotArena<CacheEntry<K, V>>,
        id: SlotId,
        frequency: u64,
    ) -> bool {
        let Some(bucket) = self.buckets.get_mut(&frequency) else {
            return false;
        };
        bucket.remove(entries, id);
        if bucket.is_empty() {
            self.buckets.remove(&frequency);
            true
        } else {
            false
        }
    }
}

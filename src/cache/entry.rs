//! Cache Entry Module
//!
//! Defines a single cached record together with its LFU and TTL metadata.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::cache::SlotId;

// == Cache Entry ==
/// One cached record.
///
/// Entries live in the store's arena. `prev`/`next` link the entry into the
/// frequency bucket matching `frequency`; the bucket itself owns nothing.
#[derive(Debug)]
pub struct CacheEntry<K, V> {
    /// Immutable once the entry is created
    pub key: K,
    pub value: V,
    /// Access count, starts at 1
    pub frequency: u64,
    /// Wall-clock time of creation or last `set`
    pub refreshed_at: DateTime<Utc>,
    /// Neighbour towards the bucket front (more recently touched)
    pub(crate) prev: Option<SlotId>,
    /// Neighbour towards the bucket back (less recently touched)
    pub(crate) next: Option<SlotId>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a detached entry at frequency 1.
    pub fn new(key: K, value: V, now: DateTime<Utc>) -> Self {
        Self {
            key,
            value,
            frequency: 1,
            refreshed_at: now,
            prev: None,
            next: None,
        }
    }

    // == Refresh ==
    /// Replaces the value and restarts the TTL clock. Frequency is untouched.
    pub fn refresh(&mut self, value: V, now: DateTime<Utc>) {
        self.value = value;
        self.refreshed_at = now;
    }

    // == Is Expired ==
    /// Checks if the entry has reached its TTL.
    ///
    /// An entry is expired once `now - refreshed_at >= ttl`, compared at full
    /// clock precision, so a lookup made exactly at the deadline already misses.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now.signed_duration_since(self.refreshed_at) >= ttl
    }
}

// == Utility Functions ==
/// Converts a TTL to chrono's signed duration, saturating on overflow.
pub fn ttl_delta(ttl: Duration) -> TimeDelta {
    TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)
}

/// Test clock: Unix epoch plus `ms` milliseconds.
#[cfg(test)]
pub(crate) fn at_ms(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

//! Frequency Bucket Module
//!
//! Recency-ordered list of the entries that share one access count.

use crate::cache::{CacheEntry, SlotArena, SlotId};

// == Frequency Bucket ==
/// Intrusive doubly-linked list threaded through arena entries.
///
/// - Front = most recently touched
/// - Back = least recently touched (eviction candidate)
///
/// Every operation is O(1). Link fields live on the entries themselves, so
/// each call borrows the arena that owns them.
#[derive(Debug, Default)]
pub struct FrequencyBucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
}

impl FrequencyBucket {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Push Front ==
    /// Links a detached entry in as the most recently touched member.
    pub fn push_front<K, V>(&mut self, entries: &mut SlotArena<CacheEntry<K, V>>, id: SlotId) {
        let old_head = self.head;
        let Some(entry) = entries.get_mut(id) else {
            return;
        };
        entry.prev = None;
        entry.next = old_head;

        match old_head.and_then(|head| entries.get_mut(head)) {
            Some(head) => head.prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    // == Remove ==
    /// Unlinks an entry given its handle. The entry must belong to this bucket.
    pub fn remove<K, V>(&mut self, entries: &mut SlotArena<CacheEntry<K, V>>, id: SlotId) {
        let (prev, next) = match entries.get_mut(id) {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match prev.and_then(|p| entries.get_mut(p)) {
            Some(prev_entry) => prev_entry.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| entries.get_mut(n)) {
            Some(next_entry) => next_entry.prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }

    // == Remove Oldest ==
    /// Detaches and returns the least recently touched entry.
    ///
    /// Returns None if the bucket is empty.
    pub fn remove_oldest<K, V>(&mut self, entries: &mut SlotArena<CacheEntry<K, V>>) -> Option<SlotId> {
        let tail = self.tail?;
        self.remove(entries, tail);
        Some(tail)
    }

    // == Peek Oldest ==
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<SlotId> {
        self.tail
    }

    // == Length ==
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

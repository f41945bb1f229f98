//! Cache Module
//!
//! Provides a bounded in-memory cache with LFU eviction and TTL expiration.

mod arena;
mod bucket;
mod entry;
mod frequency;
mod lfu;
mod stats;
mod store;


pub(crate) use arena::{SlotArena, SlotId};
pub(crate) use bucket::FrequencyBucket;
pub(crate) use entry::CacheEntry;
pub(crate) use frequency::FrequencyIndex;
pub(crate) use lfu::CacheCore;
pub(crate) use stats::StatsCounters;

// Re-export public types
pub use lfu::{EvictionCallback, LfuCache};
pub use stats::CacheStats;

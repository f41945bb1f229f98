//! LFU Cache - A bounded in-memory cache
//!
//! Provides least-frequently-used eviction with TTL expiration and a
//! background expiry sweeper.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, EvictionCallback, LfuCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{Sweeper, SweeperState};

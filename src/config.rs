//! Configuration Module
//!
//! Handles cache configuration, optionally loaded from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold (0 disables all inserts)
    pub capacity: usize,
    /// Age after which an entry becomes eligible for expiry
    pub ttl: Duration,
    /// Period between background sweeper passes
    pub cleanup_interval: Duration,
}

impl CacheConfig {
    /// Creates a config from explicit values.
    pub fn new(capacity: usize, ttl: Duration, cleanup_interval: Duration) -> Self {
        Self {
            capacity,
            ttl,
            cleanup_interval,
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LFU_CAPACITY` - Maximum cache entries (default: 1000)
    /// - `LFU_TTL_MS` - Entry TTL in milliseconds (default: 300000)
    /// - `LFU_CLEANUP_INTERVAL_MS` - Sweeper period in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env::var("LFU_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            ttl: env::var("LFU_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.ttl),
            cleanup_interval: env::var("LFU_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Rejects values the sweeper cannot run with.
    ///
    /// Capacity is not checked: zero is a valid "inserts disabled" setting.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.cleanup_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "cleanup_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            ttl: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 1000);
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.cleanup_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("LFU_CAPACITY", "64");
        env::set_var("LFU_TTL_MS", "1500");
        env::set_var("LFU_CLEANUP_INTERVAL_MS", "not-a-number");

        let config = CacheConfig::from_env();
        assert_eq!(config.capacity, 64);
        assert_eq!(config.ttl, Duration::from_millis(1500));
        // Unparsable values fall back to the default
        assert_eq!(config.cleanup_interval, Duration::from_secs(1));

        env::remove_var("LFU_CAPACITY");
        env::remove_var("LFU_TTL_MS");
        env::remove_var("LFU_CLEANUP_INTERVAL_MS");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = CacheConfig::new(10, Duration::from_secs(1), Duration::ZERO);
        assert!(matches!(config.validate(), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_accepts_zero_capacity() {
        let config = CacheConfig::new(0, Duration::from_secs(1), Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }
}

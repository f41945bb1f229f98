//! Error types for the LFU cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Lookups never fail: a missing or expired key is reported as `None`.
/// Errors only surface while constructing a cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No Tokio runtime is available to host the expiry sweeper
    #[error("No Tokio runtime available to host the expiry sweeper")]
    RuntimeUnavailable,

    /// Configuration value the cache cannot operate with
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

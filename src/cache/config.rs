//! Cache configuration.

use std::time::Duration;

/// Configuration for a cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries. `None` means unbounded.
    pub max_capacity: Option<u64>,

    /// Time-to-live for cache entries.
    pub ttl: Option<Duration>,

    /// Time-to-idle for cache entries.
    pub tti: Option<Duration>,
}

impl CacheConfig {
    /// Config for data read once per process lifetime.
    /// No capacity eviction and no expiry, so an entry is never re-read.
    pub fn persistent() -> Self {
        Self {
            max_capacity: None,
            ttl: None,
            tti: None,
        }
    }
}

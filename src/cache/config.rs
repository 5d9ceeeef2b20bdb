//! Cache configuration.

use std::time::Duration;

pub(crate) const DEFAULT_TTL_SECS: u64 = 6 * 60 * 60;

/// Cache behaviour resolved from the `[cache]` settings section.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an aggregation result is served before re-scraping.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self { ttl: settings.ttl }
    }
}

//! Process-lifetime cache for aggregated race listings.
//!
//! A single slot holds the most recent aggregation result together with the
//! instant it was produced. Readers decide freshness against the configured
//! TTL; every aggregation, including the static fallback, overwrites the slot.
//!
//! ```toml
//! [cache]
//! ttl_seconds = 21600
//! ```

mod config;
mod lock;
mod store;

use thiserror::Error;

pub use config::CacheConfig;
pub(crate) use config::DEFAULT_TTL_SECS;
pub use store::{CacheEntry, MemoryRaceCache, RaceCache};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache slot unavailable during `{op}`")]
    Unavailable { op: &'static str },
}

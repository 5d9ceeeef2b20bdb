//! Single-slot race cache.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::domain::races::RaceRecord;

use super::CacheError;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// The last full aggregation result (unfiltered, unlimited).
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Vec<RaceRecord>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn new(data: Vec<RaceRecord>) -> Self {
        Self {
            data,
            fetched_at: Instant::now(),
        }
    }

    /// Fresh while strictly less than `ttl` has elapsed since `fetched_at`.
    pub fn is_fresh_at(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.is_fresh_at(ttl, Instant::now())
    }
}

/// Storage discipline for aggregated races: one slot, last writer wins.
pub trait RaceCache: Send + Sync {
    fn get(&self) -> Result<Option<CacheEntry>, CacheError>;
    fn set(&self, entry: CacheEntry) -> Result<(), CacheError>;
}

/// In-process implementation backing [`RaceCache`].
#[derive(Debug, Default)]
pub struct MemoryRaceCache {
    slot: RwLock<Option<CacheEntry>>,
}

impl MemoryRaceCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RaceCache for MemoryRaceCache {
    fn get(&self) -> Result<Option<CacheEntry>, CacheError> {
        Ok(rw_read(&self.slot, SOURCE, "get")?.clone())
    }

    fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        *rw_write(&self.slot, SOURCE, "set")? = Some(entry);
        Ok(())
    }
}

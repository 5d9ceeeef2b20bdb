//! Race listing service: cache-first reads backed by live aggregation.

mod aggregate;
mod query;

use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::error::AppError;
use crate::cache::{CacheConfig, CacheEntry, RaceCache};
use crate::domain::fallback::fallback_races;
use crate::domain::races::RaceRecord;
use crate::util::timezone::today_in;

pub use aggregate::{Aggregator, HORIZON_DAYS};
pub use query::{MAX_LIMIT, MIN_LIMIT, RaceQuery, RawRaceQuery, ValidationIssues};

const METRIC_CACHE_HIT: &str = "racefinder_cache_hit_total";
const METRIC_CACHE_MISS: &str = "racefinder_cache_miss_total";
const METRIC_FALLBACK_SERVED: &str = "racefinder_fallback_served_total";

const TARGET: &str = "racefinder::races";

/// Response payload for race queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceListing {
    pub fallback: bool,
    pub count: usize,
    pub items: Vec<RaceRecord>,
}

impl RaceListing {
    pub fn live(items: Vec<RaceRecord>) -> Self {
        Self {
            fallback: false,
            count: items.len(),
            items,
        }
    }

    /// The static sample list, filtered and limited for `query`.
    pub fn fallback(query: &RaceQuery) -> Self {
        counter!(METRIC_FALLBACK_SERVED).increment(1);
        let items = query.apply(&fallback_races());
        Self {
            fallback: true,
            count: items.len(),
            items,
        }
    }
}

pub struct RaceService {
    aggregator: Aggregator,
    cache: Arc<dyn RaceCache>,
    cache_config: CacheConfig,
    timezone: Tz,
}

impl RaceService {
    pub fn new(
        aggregator: Aggregator,
        cache: Arc<dyn RaceCache>,
        cache_config: CacheConfig,
        timezone: Tz,
    ) -> Self {
        Self {
            aggregator,
            cache,
            cache_config,
            timezone,
        }
    }

    pub fn today(&self) -> NaiveDate {
        today_in(self.timezone)
    }

    /// Serve `query` from a fresh cache entry, re-aggregating when stale.
    ///
    /// An aggregation that yields nothing caches and serves the static
    /// fallback list. Storage failures and dead source tasks are returned
    /// to the caller, which decides how to degrade.
    pub async fn query(&self, query: &RaceQuery) -> Result<RaceListing, AppError> {
        if let Some(entry) = self.cache.get()? {
            if entry.is_fresh(self.cache_config.ttl) {
                counter!(METRIC_CACHE_HIT).increment(1);
                debug!(
                    target: TARGET,
                    cached = entry.data.len(),
                    "Serving races from cache"
                );
                return Ok(RaceListing::live(query.apply(&entry.data)));
            }
        }

        counter!(METRIC_CACHE_MISS).increment(1);
        let races = self.aggregate().await?;

        if races.is_empty() {
            warn!(
                target: TARGET,
                "Aggregation produced no races; serving fallback list"
            );
            self.cache.set(CacheEntry::new(fallback_races()))?;
            return Ok(RaceListing::fallback(query));
        }

        let listing = RaceListing::live(query.apply(&races));
        self.cache.set(CacheEntry::new(races))?;
        Ok(listing)
    }

    /// Run a full aggregation without touching the cache.
    pub async fn aggregate(&self) -> Result<Vec<RaceRecord>, AppError> {
        let today = self.today();
        info!(
            target: TARGET,
            today = %today,
            sources = self.aggregator.sources().len(),
            "Aggregating race listings"
        );
        self.aggregator.run(today).await
    }
}

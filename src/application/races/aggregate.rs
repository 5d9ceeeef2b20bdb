//! One aggregation run: fetch, extract and normalize every source concurrently.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use futures::future::join_all;
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::application::error::AppError;
use crate::application::sources::{ListingSource, PageFetcher};
use crate::domain::collate::collate;
use crate::domain::dates::DateWindow;
use crate::domain::normalize::normalize;
use crate::domain::races::RaceRecord;
use crate::infra::scrape::extract_candidates;

pub(super) const METRIC_SOURCE_FAILURES: &str = "racefinder_source_failures_total";
pub(super) const METRIC_AGGREGATE_MS: &str = "racefinder_aggregate_ms";

const TARGET: &str = "racefinder::aggregate";

/// Days after today still accepted by the date window.
pub const HORIZON_DAYS: u64 = 365;

#[derive(Clone)]
pub struct Aggregator {
    fetcher: Arc<dyn PageFetcher>,
    sources: Arc<[ListingSource]>,
    result_ceiling: usize,
}

impl Aggregator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        sources: Vec<ListingSource>,
        result_ceiling: usize,
    ) -> Self {
        Self {
            fetcher,
            sources: sources.into(),
            result_ceiling,
        }
    }

    pub fn sources(&self) -> &[ListingSource] {
        &self.sources
    }

    /// Merge every source's races for a window starting at `today`.
    ///
    /// Failing sources contribute nothing. Only a source task that dies
    /// (panic or cancellation) fails the run.
    pub async fn run(&self, today: NaiveDate) -> Result<Vec<RaceRecord>, AppError> {
        let started_at = Instant::now();
        let window = DateWindow::starting(today, HORIZON_DAYS);

        let tasks = self.sources.iter().cloned().map(|source| {
            let fetcher = Arc::clone(&self.fetcher);
            tokio::spawn(async move { scrape_source(fetcher.as_ref(), &source, &window).await })
        });

        let mut merged = Vec::new();
        for joined in join_all(tasks).await {
            let records = joined
                .map_err(|err| AppError::unexpected(format!("source task failed: {err}")))?;
            merged.extend(records);
        }

        let scraped = merged.len();
        let races = collate(merged, self.result_ceiling);

        histogram!(METRIC_AGGREGATE_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        info!(
            target: TARGET,
            sources = self.sources.len(),
            scraped,
            kept = races.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Aggregation finished"
        );

        Ok(races)
    }
}

async fn scrape_source(
    fetcher: &dyn PageFetcher,
    source: &ListingSource,
    window: &DateWindow,
) -> Vec<RaceRecord> {
    let html = match fetcher.fetch(&source.url).await {
        Ok(html) => html,
        Err(err) => {
            counter!(METRIC_SOURCE_FAILURES, "stage" => "fetch").increment(1);
            warn!(
                target: TARGET,
                source = %source.url,
                distance = %source.distance,
                error = %err,
                "Skipping source after fetch failure"
            );
            return Vec::new();
        }
    };

    let candidates = match extract_candidates(&html, source) {
        Ok(candidates) => candidates,
        Err(err) => {
            counter!(METRIC_SOURCE_FAILURES, "stage" => "extract").increment(1);
            warn!(
                target: TARGET,
                source = %source.url,
                distance = %source.distance,
                error = %err,
                "Skipping source after parse failure"
            );
            return Vec::new();
        }
    };

    let extracted = candidates.len();
    let records: Vec<RaceRecord> = candidates
        .into_iter()
        .filter_map(|candidate| match normalize(candidate, window) {
            Ok(record) => Some(record),
            Err(rejection) => {
                debug!(
                    target: TARGET,
                    source = %source.url,
                    reason = rejection.kind(),
                    detail = %rejection,
                    "Dropping candidate"
                );
                None
            }
        })
        .collect();

    debug!(
        target: TARGET,
        source = %source.url,
        extracted,
        accepted = records.len(),
        "Source scraped"
    );
    records
}

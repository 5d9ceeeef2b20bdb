#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use chrono::Days;
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

use racefinder::application::races::{Aggregator, RaceService};
use racefinder::application::sources::{FetchError, ListingSource, PageFetcher};
use racefinder::cache::{CacheConfig, CacheEntry, CacheError, MemoryRaceCache, RaceCache};
use racefinder::domain::races::Distance;
use racefinder::infra::http::{HttpState, build_router};
use racefinder::util::timezone::today_in;

pub const HALF_URL: &str = "https://listing.test/ironman-70-3-events";
pub const FULL_URL: &str = "https://listing.test/ironman-events";

pub fn sources() -> Vec<ListingSource> {
    vec![
        ListingSource::new(Distance::Half, Url::parse(HALF_URL).expect("url")),
        ListingSource::new(Distance::Full, Url::parse(FULL_URL).expect("url")),
    ]
}

/// Serves canned pages by URL; unknown URLs fail like an unreachable host.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

pub struct PanickingFetcher;

#[async_trait]
impl PageFetcher for PanickingFetcher {
    async fn fetch(&self, _url: &Url) -> Result<String, FetchError> {
        panic!("fetcher blew up");
    }
}

/// A cache whose slot can never be read or written.
pub struct BrokenCache;

impl RaceCache for BrokenCache {
    fn get(&self) -> Result<Option<CacheEntry>, CacheError> {
        Err(CacheError::Unavailable { op: "get" })
    }

    fn set(&self, _entry: CacheEntry) -> Result<(), CacheError> {
        Err(CacheError::Unavailable { op: "set" })
    }
}

pub fn race_service(fetcher: Arc<dyn PageFetcher>, cache: Arc<dyn RaceCache>) -> Arc<RaceService> {
    Arc::new(RaceService::new(
        Aggregator::new(fetcher, sources(), 12),
        cache,
        CacheConfig {
            ttl: Duration::from_secs(6 * 60 * 60),
        },
        chrono_tz::America::Los_Angeles,
    ))
}

pub fn app(fetcher: Arc<dyn PageFetcher>) -> Router {
    app_with_cache(fetcher, Arc::new(MemoryRaceCache::new()))
}

pub fn app_with_cache(fetcher: Arc<dyn PageFetcher>, cache: Arc<dyn RaceCache>) -> Router {
    build_router(HttpState {
        races: race_service(fetcher, cache),
    })
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body should be json")
    };
    (status, json)
}

/// Listing date text `days_ahead` days after today in the reference zone.
pub fn date_text(days_ahead: u64) -> String {
    today_in(chrono_tz::America::Los_Angeles)
        .checked_add_days(Days::new(days_ahead))
        .expect("date in range")
        .format("%b %-d, %Y")
        .to_string()
}

pub fn event_card(name: &str, days_ahead: u64, href: &str, badge: &str) -> String {
    format!(
        r#"<div class="event-card">
             <h3>{name}</h3>
             <p class="location">Somewhere, USA</p>
             <p class="date">{}</p>
             <span class="badge">{badge}</span>
             <a href="{href}">Race details</a>
           </div>"#,
        date_text(days_ahead)
    )
}

pub fn listing_page(cards: &[String]) -> String {
    format!(
        "<!doctype html><html><body><main>{}</main></body></html>",
        cards.concat()
    )
}

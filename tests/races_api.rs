mod support;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::Value;

use support::{
    BrokenCache, FULL_URL, HALF_URL, PanickingFetcher, StubFetcher, app, app_with_cache,
    event_card, get_json, listing_page,
};

fn names(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|item| item["name"].as_str().expect("name").to_string())
        .collect()
}

fn live_fetcher() -> Arc<StubFetcher> {
    Arc::new(
        StubFetcher::default()
            .with_page(
                HALF_URL,
                listing_page(&[
                    event_card("IRONMAN 70.3 Oceanside", 30, "/im703-oceanside", "Open"),
                    event_card("IRONMAN 70.3 St. George", 10, "/im703-st-george", "Waitlist"),
                ]),
            )
            .with_page(
                FULL_URL,
                listing_page(&[event_card("IRONMAN Texas", 20, "/im-texas", "")]),
            ),
    )
}

#[tokio::test]
async fn invalid_distance_is_rejected_without_scraping() {
    let fetcher = Arc::new(StubFetcher::unreachable());
    let app = app(fetcher.clone());

    let (status, body) = get_json(&app, "/races?distance=INVALID").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_INPUT");
    assert!(body["issues"]["fieldErrors"]["distance"].is_array());
    assert_eq!(body["issues"]["formErrors"], serde_json::json!([]));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn limit_outside_range_is_rejected() {
    let app = app(Arc::new(StubFetcher::unreachable()));

    for uri in ["/races?limit=50", "/races?limit=0", "/races?limit=abc"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "BAD_INPUT");
        assert!(body["issues"]["fieldErrors"]["limit"].is_array(), "{uri}");
    }
}

#[tokio::test]
async fn repeated_parameters_use_the_first_value() {
    let app = app(Arc::new(StubFetcher::unreachable()));

    let uri = "/races?limit=2&limit=50&distance=FULL&distance=BOGUS";
    let (status, body) = get_json(&app, uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(
        body["items"]
            .as_array()
            .expect("items")
            .iter()
            .all(|item| item["distance"] == "Full")
    );
}

#[tokio::test]
async fn unreachable_sources_serve_filtered_fallback() {
    let app = app(Arc::new(StubFetcher::unreachable()));

    let (status, body) = get_json(&app, "/races?distance=HALF&limit=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["count"], 3);
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item["distance"] == "70.3"));
}

#[tokio::test]
async fn valid_queries_respect_limit() {
    let app = app(Arc::new(StubFetcher::unreachable()));

    let (status, body) = get_json(&app, "/races?distance=FULL&limit=3").await;
    assert_ne!(status, StatusCode::BAD_REQUEST);
    assert!(body["count"].as_u64().expect("count") <= 3);

    let (status, body) = get_json(&app, "/races").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["count"].as_u64().expect("count") >= 1);
}

#[tokio::test]
async fn live_results_are_sorted_and_filtered() {
    let app = app(live_fetcher());

    let (status, body) = get_json(&app, "/races").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], false);
    assert_eq!(
        names(&body),
        [
            "IRONMAN 70.3 St. George",
            "IRONMAN Texas",
            "IRONMAN 70.3 Oceanside"
        ]
    );

    let first = &body["items"][0];
    assert_eq!(first["distance"], "70.3");
    assert_eq!(first["status"], "Waitlist");
    assert_eq!(first["url"], "https://listing.test/im703-st-george");
    assert!(first["dateISO"].as_str().expect("dateISO").len() == 10);

    let (_, full) = get_json(&app, "/api/races?distance=FULL").await;
    assert_eq!(names(&full), ["IRONMAN Texas"]);
    assert_eq!(full["items"][0]["status"], "Unknown");
}

#[tokio::test]
async fn repeated_queries_within_ttl_hit_the_cache() {
    let fetcher = live_fetcher();
    let app = app(fetcher.clone());

    let (_, first) = get_json(&app, "/races?limit=12").await;
    let (_, second) = get_json(&app, "/races?limit=12").await;

    assert_eq!(first["items"], second["items"]);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn duplicate_urls_across_sources_collapse() {
    let card = event_card("IRONMAN 70.3 Oceanside", 30, "/shared-race", "Open");
    let fetcher = Arc::new(
        StubFetcher::default()
            .with_page(HALF_URL, listing_page(std::slice::from_ref(&card)))
            .with_page(
                FULL_URL,
                listing_page(&[event_card("Renamed duplicate", 31, "/shared-race", "")]),
            ),
    );
    let app = app(fetcher);

    let (_, body) = get_json(&app, "/races").await;

    assert_eq!(body["count"], 1);
    assert_eq!(names(&body), ["IRONMAN 70.3 Oceanside"]);
    assert_eq!(body["items"][0]["distance"], "70.3");
}

#[tokio::test]
async fn races_outside_the_window_are_excluded() {
    let fetcher = Arc::new(StubFetcher::default().with_page(
        HALF_URL,
        listing_page(&[
            event_card("Next week", 7, "/next-week", ""),
            event_card("Too far out", 400, "/too-far", ""),
        ]),
    ));
    let app = app(fetcher);

    let (_, body) = get_json(&app, "/races").await;

    assert_eq!(body["fallback"], false);
    assert_eq!(names(&body), ["Next week"]);
}

#[tokio::test]
async fn storage_failure_reports_db_unavailable() {
    let app = app_with_cache(Arc::new(StubFetcher::unreachable()), Arc::new(BrokenCache));

    let (status, body) = get_json(&app, "/races").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        serde_json::json!({
            "error": "DB_UNAVAILABLE",
            "message": "Database temporarily unavailable"
        })
    );
}

#[tokio::test]
async fn crashed_source_task_degrades_to_fallback() {
    let app = app(Arc::new(PanickingFetcher));

    let (status, body) = get_json(&app, "/races?distance=FULL&limit=2").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["count"], 2);
    assert!(
        body["items"]
            .as_array()
            .expect("items")
            .iter()
            .all(|item| item["distance"] == "Full")
    );
}

#[tokio::test]
async fn health_route_is_empty_success() {
    let fetcher = Arc::new(StubFetcher::unreachable());
    let app = app(fetcher.clone());

    let (status, body) = get_json(&app, "/_health").await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    assert_eq!(fetcher.calls(), 0);
}

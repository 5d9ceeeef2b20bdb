use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::races::{
    RaceListing, RaceQuery, RaceService, RawRaceQuery, ValidationIssues,
};

use super::error::RaceApiError;
use super::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub races: Arc<RaceService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/races", get(list_races))
        .route("/api/races", get(list_races))
        .route("/_health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn list_races(
    State(state): State<HttpState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let raw = match query {
        Ok(Query(pairs)) => RawRaceQuery::from_pairs(pairs),
        Err(rejection) => {
            return RaceApiError::BadInput(ValidationIssues::form(rejection.body_text()))
                .into_response();
        }
    };

    let query = match RaceQuery::from_raw(&raw) {
        Ok(query) => query,
        Err(issues) => return RaceApiError::BadInput(issues).into_response(),
    };

    match state.races.query(&query).await {
        Ok(listing) => (StatusCode::OK, Json(listing)).into_response(),
        Err(err) if err.is_storage() => RaceApiError::Unavailable(err).into_response(),
        Err(err) => RaceApiError::Degraded {
            listing: RaceListing::fallback(&query),
            cause: err,
        }
        .into_response(),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::{AppError, ErrorReport};
use crate::application::races::{RaceListing, ValidationIssues};

pub mod codes {
    pub const BAD_INPUT: &str = "BAD_INPUT";
    pub const DB_UNAVAILABLE: &str = "DB_UNAVAILABLE";
}

const SOURCE: &str = "infra::http::races";
const DB_UNAVAILABLE_MESSAGE: &str = "Database temporarily unavailable";

#[derive(Debug, Serialize)]
struct BadInputBody {
    error: &'static str,
    issues: ValidationIssues,
}

#[derive(Debug, Serialize)]
struct UnavailableBody {
    error: &'static str,
    message: &'static str,
}

/// Non-success outcomes of the race listing endpoint.
#[derive(Debug)]
pub enum RaceApiError {
    BadInput(ValidationIssues),
    Unavailable(AppError),
    /// The static list served with 503 after an unexpected failure.
    Degraded {
        listing: RaceListing,
        cause: AppError,
    },
}

impl IntoResponse for RaceApiError {
    fn into_response(self) -> Response {
        match self {
            RaceApiError::BadInput(issues) => {
                let detail = summarize(&issues);
                let body = BadInputBody {
                    error: codes::BAD_INPUT,
                    issues,
                };
                let mut response = (StatusCode::BAD_REQUEST, Json(body)).into_response();
                ErrorReport::from_message(
                    SOURCE,
                    StatusCode::BAD_REQUEST,
                    format!("{}: {detail}", codes::BAD_INPUT),
                )
                .attach(&mut response);
                response
            }
            RaceApiError::Unavailable(cause) => {
                let body = UnavailableBody {
                    error: codes::DB_UNAVAILABLE,
                    message: DB_UNAVAILABLE_MESSAGE,
                };
                let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
                ErrorReport::from_error(SOURCE, StatusCode::SERVICE_UNAVAILABLE, &cause)
                    .attach(&mut response);
                response
            }
            RaceApiError::Degraded { listing, cause } => {
                let mut response =
                    (StatusCode::SERVICE_UNAVAILABLE, Json(listing)).into_response();
                ErrorReport::from_error(SOURCE, StatusCode::SERVICE_UNAVAILABLE, &cause)
                    .attach(&mut response);
                response
            }
        }
    }
}

fn summarize(issues: &ValidationIssues) -> String {
    let mut parts: Vec<String> = issues.form_errors.clone();
    parts.extend(
        issues
            .field_errors
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join("; "))),
    );
    parts.join(", ")
}

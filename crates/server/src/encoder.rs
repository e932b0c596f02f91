//! Response encoding for completed lifecycles and rendering for every other
//! dispatch outcome.
//!
//! [`encode`] is the only place an [`ActionResult`] becomes a response, and
//! it is only reached from [`render_outcome`] for a completed lifecycle.

use actroute_core::{ActionResult, Fault, HttpVerb, Payload, Violation};
use actroute_router::DispatchOutcome;
use axum::Json;
use axum::body::Body;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Generic body for every internal fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// JSON body for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl ErrorResponse {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            violations: None,
        }
    }
}

/// Turn a completed [`ActionResult`] into a response.
///
/// JSON payloads are serialized with `200 OK` unless the result carries a
/// status hint. Binary payloads are written verbatim with their content
/// type and never pass through JSON serialization. A `204` hint always
/// yields an empty body.
pub fn encode(result: ActionResult) -> Response {
    let status = result
        .status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::OK);

    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }

    match result.payload {
        Payload::Json(value) => (status, Json(value)).into_response(),
        Payload::Binary { data, content_type } => {
            let content_type = HeaderValue::from_str(&content_type).unwrap_or_else(|_| {
                HeaderValue::from_static("application/octet-stream")
            });
            (status, [(header::CONTENT_TYPE, content_type)], Body::from(data)).into_response()
        }
    }
}

/// Render any dispatch outcome as exactly one response.
pub fn render_outcome(outcome: DispatchOutcome) -> Response {
    match outcome {
        DispatchOutcome::Completed(result) => encode(result),
        DispatchOutcome::NotFound => not_found(),
        DispatchOutcome::MethodNotAllowed { allowed } => method_not_allowed(&allowed),
        DispatchOutcome::Forbidden { .. } => error(StatusCode::FORBIDDEN, "forbidden"),
        DispatchOutcome::Invalid(violations) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "validation failed".to_owned(),
                violations: Some(violations),
            }),
        )
            .into_response(),
        DispatchOutcome::Failed(failure) => match failure.fault() {
            Fault::Caller => {
                let status =
                    StatusCode::from_u16(failure.error.status()).unwrap_or(StatusCode::BAD_REQUEST);
                error(status, failure.error.to_string())
            }
            Fault::Internal => error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE),
        },
    }
}

pub(crate) fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "not found")
}

pub(crate) fn method_not_allowed(allowed: &[HttpVerb]) -> Response {
    let allow = allowed
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let mut response = error(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::message(message))).into_response()
}

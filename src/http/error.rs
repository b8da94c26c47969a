//! Centralized error handling.
//!
//! # Data Flow
//! ```text
//! dispatch ─┬─ matched ── handler ── Ok(response) ───────────────▶ client
//!           │                    └── Err(AppError) ─┐
//!           └─ unmatched ── not_found ──────────────┴─▶ ErrorRecord
//!                                                       │
//!                      error_pipeline (log + render) ◀──┘
//! ```
//!
//! Handlers never build error responses themselves. An [`AppError`] turns
//! into a bare response carrying an [`ErrorRecord`] extension, and
//! [`error_pipeline`] replaces it with the JSON or HTML rendering the
//! request asked for. The body limit's 413 and routing's 405 are picked up
//! the same way.

use axum::{
    body::Body,
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, Request, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::Environment;
use crate::observability::logging::redact_headers;
use crate::http::views::ErrorView;
use crate::security::rate_limit::RATE_LIMIT_MESSAGE;

/// Every error a request can end in.
///
/// Invalid form input and upstream failures are not here: handlers recover
/// from those by re-rendering the page with a message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found - {0}")]
    NotFound(String),

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    #[error("Payload Too Large")]
    PayloadTooLarge,

    /// An error that carries its own status code.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Internal Server Error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Status { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain `{"error": message}` body for layers that answer before the
    /// error pipeline runs.
    pub fn into_json_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }

    fn detail(&self) -> String {
        match self {
            AppError::Internal(source) => format!("{source:?}"),
            other => format!("{other:?}"),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        let status = rejection.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::with_status(status, rejection.body_text())
        }
    }
}

/// What the error pipeline needs to know about a failed request.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub status: StatusCode,
    pub message: String,
    /// Cause chain / debug rendering. Shown to clients outside production.
    pub stack: Option<String>,
}

impl From<&AppError> for ErrorRecord {
    fn from(error: &AppError) -> Self {
        Self {
            status: error.status(),
            message: error.to_string(),
            stack: Some(error.detail()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let record = ErrorRecord::from(&self);
        let mut response = record.status.into_response();
        response.extensions_mut().insert(record);
        response
    }
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> AppError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    AppError::NotFound(path)
}

/// Whether the client expects a JSON error rather than an HTML page.
pub fn wants_json(headers: &HeaderMap) -> bool {
    let header_is = |name: header::HeaderName, expected: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().starts_with(expected))
            .unwrap_or(false)
    };

    header_is(header::HeaderName::from_static("x-requested-with"), "xmlhttprequest")
        || header_is(header::CONTENT_TYPE, "application/json")
        || header_is(header::ACCEPT, "application/json")
}

/// Errors produced by layers and routing rather than handlers.
fn bare_error(status: StatusCode) -> Option<ErrorRecord> {
    let error = match status {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
        StatusCode::METHOD_NOT_ALLOWED => AppError::with_status(status, "Method Not Allowed"),
        _ => return None,
    };
    Some(ErrorRecord::from(&error))
}

/// Final stage of every request: turns [`ErrorRecord`]s into responses.
pub async fn error_pipeline(
    State(environment): State<Environment>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = request.headers().clone();

    let response = next.run(request).await;
    let Some(record) = response
        .extensions()
        .get::<ErrorRecord>()
        .cloned()
        .or_else(|| bare_error(response.status()))
    else {
        return response;
    };

    let logged_headers = redact_headers(&headers);
    if record.status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            headers = ?logged_headers,
            status = record.status.as_u16(),
            detail = record.stack.as_deref().unwrap_or(""),
            "{}",
            record.message
        );
    } else {
        tracing::error!(
            method = %method,
            uri = %uri,
            headers = ?logged_headers,
            status = record.status.as_u16(),
            detail = record.stack.as_deref().unwrap_or(""),
            "{}",
            record.message
        );
    }

    render(&record, wants_json(&headers), environment)
}

fn render(record: &ErrorRecord, json: bool, environment: Environment) -> Response {
    let stack = if environment.is_production() {
        None
    } else {
        record.stack.as_deref()
    };

    if json {
        let mut body = json!({
            "error": record.message,
            "status": record.status.as_u16(),
        });
        if let Some(stack) = stack {
            body["stack"] = json!(stack);
        }
        return (record.status, Json(body)).into_response();
    }

    let page = ErrorView {
        status: record.status,
        message: &record.message,
        stack,
    };
    (record.status, Html(page.render())).into_response()
}

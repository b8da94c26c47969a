//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide `tracing` subscriber
//! - Wrap every request in a span carrying its correlation id
//! - Emit one access line per request, levelled by response status
//! - Redact sensitive headers before they reach a log line
//!
//! # Design Decisions
//! - JSON format outside development, human-readable format in development
//! - `RUST_LOG` overrides the configured level
//! - Successful health checks are not access-logged

use std::collections::BTreeMap;
use std::time::Instant;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::{AppConfig, Environment};
use crate::http::server::HEALTH_PATH;
use crate::observability::metrics;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Headers whose values never appear in logs.
pub const SENSITIVE_HEADERS: [HeaderName; 4] = [
    header::AUTHORIZATION,
    header::COOKIE,
    header::PROXY_AUTHORIZATION,
    header::SET_COOKIE,
];

const REDACTED: &str = "[REDACTED]";

/// Initialize the global tracing subscriber.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter()));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.environment == Environment::Development {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}

/// Generates UUID v4 request ids for requests that arrive without one.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        Uuid::new_v4().to_string().parse().ok().map(RequestId::new)
    }
}

/// Outermost request wrapper: correlation span plus access log line.
pub async fn access_log(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span.clone()).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    metrics::record_request(method.as_str(), status.as_u16(), start);

    let code = status.as_u16();
    span.in_scope(|| {
        if status.is_server_error() {
            tracing::error!(status = code, latency_ms, "{} {} {}", method, uri, code);
        } else if status.is_client_error() {
            tracing::warn!(status = code, latency_ms, "{} {} {}", method, uri, code);
        } else if !is_quiet(uri.path(), status) {
            tracing::info!(status = code, latency_ms, "{} {} {}", method, uri, code);
        }
    });

    response
}

fn is_quiet(path: &str, status: StatusCode) -> bool {
    path == HEALTH_PATH && status.is_success()
}

/// Render headers for logging, masking sensitive values.
///
/// Values flagged sensitive by `SetSensitiveRequestHeadersLayer` and the
/// names in [`SENSITIVE_HEADERS`] are both masked.
pub fn redact_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            let rendered = if value.is_sensitive() || SENSITIVE_HEADERS.contains(name) {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), rendered)
        })
        .collect()
}

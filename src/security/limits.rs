//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//!
//! # Design Decisions
//! - A declared `Content-Length` above the limit is rejected before any
//!   handler runs (413 Payload Too Large)
//! - Chunked bodies are cut off while being buffered
//! - Both surface as 413 through the error pipeline
//! - axum's own 2MB default is disabled so the configured limit is the only one

use axum::extract::DefaultBodyLimit;
use tower_http::limit::RequestBodyLimitLayer;

/// Layers enforcing `limit` bytes per request body.
pub fn body_limit_layers(limit: usize) -> (DefaultBodyLimit, RequestBodyLimitLayer) {
    (DefaultBodyLimit::disable(), RequestBodyLimitLayer::new(limit))
}

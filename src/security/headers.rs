//! Security response headers.
//!
//! # Responsibilities
//! - Restrict content sources with a Content-Security-Policy
//! - Deny framing (`X-Frame-Options`, `frame-ancestors`)
//! - Add the remaining hardening headers browsers honour
//!
//! # Design Decisions
//! - Headers override anything a handler set
//! - No Cross-Origin-Embedder-Policy, so third-party images keep loading

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
style-src 'self' 'unsafe-inline'; \
script-src 'self'; \
img-src 'self' data: https:; \
connect-src 'self'; \
font-src 'self'; \
object-src 'none'; \
media-src 'self'; \
frame-src 'none'; \
base-uri 'self'; \
form-action 'self'; \
frame-ancestors 'none'; \
script-src-attr 'none'";

/// Header name / value pairs applied to every response.
pub const HARDENING_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "DENY"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Middleware adding [`HARDENING_HEADERS`] to the response.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for &(name, value) in HARDENING_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

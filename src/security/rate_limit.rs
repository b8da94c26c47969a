//! Fixed-window rate limiting per client.
//!
//! # Responsibilities
//! - Identify the client (peer address, or forwarded address behind a trusted proxy)
//! - Count requests per client within the configured window
//! - Reject with 429 once the count exceeds the configured maximum
//! - Advertise the policy via `RateLimit-*` headers
//!
//! # Design Decisions
//! - Counters live behind [`CounterStore`] so a shared store can replace the
//!   in-memory one without touching the middleware
//! - Increment and read happen as one step per key
//! - The health check path is never counted

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;
use crate::http::error::AppError;
use crate::http::server::HEALTH_PATH;
use crate::observability::metrics;

/// Message returned with every 429.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Result of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    /// Requests seen in the current window, this one included.
    pub count: u32,
    /// Time until the current window ends.
    pub reset_after: Duration,
}

/// Storage for per-client request counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count one request for `key` in the window of length `window` and
    /// return the updated count. Starts a new window when the previous one
    /// has elapsed.
    async fn increment(&self, key: &str, window: Duration) -> WindowHit;
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    window_start: Instant,
}

/// Process-local counter store.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    entries: DashMap<String, WindowEntry>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self, window: Duration) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < window);
        before.saturating_sub(self.entries.len())
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Periodically sweep expired entries until shutdown is signalled.
    pub async fn run_sweeper(self: Arc<Self>, window: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(window);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.sweep(window);
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.len(), "Swept expired rate limit windows");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rate limit sweeper stopping");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> WindowHit {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| WindowEntry {
                count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= window {
            entry.count = 0;
            entry.window_start = now;
        }
        entry.count = entry.count.saturating_add(1);

        WindowHit {
            count: entry.count,
            reset_after: window.saturating_sub(now.duration_since(entry.window_start)),
        }
    }
}

/// Shared state of the rate limiting middleware.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    window: Duration,
    max_requests: u32,
    trust_proxy: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: &RateLimitConfig, trust_proxy: bool) -> Self {
        Self {
            store,
            window: config.window,
            max_requests: config.max_requests,
            trust_proxy,
        }
    }

    fn policy_headers(&self, hit: WindowHit) -> [(HeaderName, HeaderValue); 4] {
        let reset_secs = ceil_secs(hit.reset_after);
        let remaining = self.max_requests.saturating_sub(hit.count);
        [
            (
                HeaderName::from_static("ratelimit-policy"),
                header_value(format!("{};w={}", self.max_requests, ceil_secs(self.window))),
            ),
            (
                HeaderName::from_static("ratelimit-limit"),
                header_value(self.max_requests.to_string()),
            ),
            (
                HeaderName::from_static("ratelimit-remaining"),
                header_value(remaining.to_string()),
            ),
            (
                HeaderName::from_static("ratelimit-reset"),
                header_value(reset_secs.to_string()),
            ),
        ]
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn header_value(value: String) -> HeaderValue {
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

/// Determine the client identity used as the counter key.
///
/// With `trust_proxy`, only the right-most `X-Forwarded-For` entry is
/// considered: it is the address the single trusted proxy saw, and every
/// entry left of it is client-controlled. Proxies that append `ip:port`
/// are accepted. If that entry does not parse, the peer address is used.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        let last_hop = headers
            .get_all(&X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .last()
            .and_then(parse_forwarded_ip);
        if let Some(ip) = last_hop {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_forwarded_ip(entry: &str) -> Option<IpAddr> {
    let entry = entry.trim();
    entry
        .parse::<IpAddr>()
        .ok()
        .or_else(|| entry.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
        .or_else(|| {
            entry
                .strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|inner| inner.parse::<IpAddr>().ok())
        })
}

/// Middleware function for fixed-window rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == HEALTH_PATH {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_identity(request.headers(), peer, limiter.trust_proxy);

    let hit = limiter.store.increment(&key, limiter.window).await;
    let headers = limiter.policy_headers(hit);

    if hit.count > limiter.max_requests {
        tracing::warn!(client = %key, count = hit.count, max = limiter.max_requests, "Rate limit exceeded");
        metrics::record_rate_limited();

        let mut response = AppError::RateLimited.into_json_response();
        let response_headers = response.headers_mut();
        response_headers.extend(headers);
        response_headers.insert(
            header::RETRY_AFTER,
            header_value(ceil_secs(hit.reset_after).to_string()),
        );
        return response;
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(headers);
    response
}

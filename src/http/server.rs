//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with every page handler
//! - Wire the middleware chain in its fixed order
//! - Start background tasks and hand the listener to the lifecycle
//!
//! # Middleware order
//! ```text
//! request id → sensitive headers → access log
//!     → security headers → CORS → rate limit
//!     → compression → error pipeline → body limit → handler
//! ```

use std::io;
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
};

use crate::config::AppConfig;
use crate::http::{error, handlers};
use crate::lifecycle::{DrainOutcome, Lifecycle};
use crate::observability::logging::{access_log, MakeRequestUuid, SENSITIVE_HEADERS, X_REQUEST_ID};
use crate::security::{
    compression::{compression_layer, honor_no_compression},
    cors::cors_layer,
    headers::security_headers,
    limits::body_limit_layers,
    rate_limit::{rate_limit_middleware, InMemoryCounterStore, RateLimiter},
};
use crate::upstream::ApiClient;

/// Liveness check path. Exempt from rate limiting and quiet in access logs.
pub const HEALTH_PATH: &str = "/health";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn ApiClient>,
}

/// The frontend HTTP server.
pub struct FrontendServer {
    router: Router,
    config: AppConfig,
    counters: Arc<InMemoryCounterStore>,
}

impl FrontendServer {
    /// Create a new server with the given configuration and upstream client.
    pub fn new(config: AppConfig, api: Arc<dyn ApiClient>) -> Self {
        let counters = Arc::new(InMemoryCounterStore::new());
        let limiter = Arc::new(RateLimiter::new(
            counters.clone(),
            &config.rate_limit,
            config.trust_proxy,
        ));

        let router = Self::build_router(&config, AppState { api }, limiter);
        Self {
            router,
            config,
            counters,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers added later wrap the ones added earlier, so the chain reads
    /// bottom-up here.
    fn build_router(config: &AppConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
        Router::new()
            .route("/", get(handlers::index))
            .route("/create", get(handlers::create_form))
            .route("/users", post(handlers::create_user))
            .route(HEALTH_PATH, get(handlers::health))
            .fallback(error::not_found)
            .with_state(state)
            .layer(body_limit_layers(config.body_limit))
            .layer(from_fn_with_state(config.environment, error::error_pipeline))
            .layer(compression_layer())
            .layer(from_fn(honor_no_compression))
            .layer(from_fn_with_state(limiter, rate_limit_middleware))
            .layer(cors_layer(&config.cors_origin))
            .layer(from_fn(security_headers))
            .layer(from_fn(access_log))
            .layer(SetSensitiveRequestHeadersLayer::new(SENSITIVE_HEADERS))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until the lifecycle drains or gives up.
    pub async fn run(self, listener: TcpListener, lifecycle: &Lifecycle) -> io::Result<DrainOutcome> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            port = addr.port(),
            env = %self.config.environment,
            api_url = %self.config.api_url,
            "Frontend server started"
        );

        tokio::spawn(
            self.counters
                .clone()
                .run_sweeper(self.config.rate_limit.window, lifecycle.subscribe()),
        );

        let outcome = lifecycle.serve(listener, self.router).await?;
        tracing::info!(outcome = ?outcome, "HTTP server stopped");
        Ok(outcome)
    }
}

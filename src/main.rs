//! User management web frontend.
//!
//! Renders HTML pages for listing and creating users, backed by a JSON
//! user API.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                    FRONTEND                      │
//!   Browser       │  ┌──────────┐   ┌───────────┐   ┌────────────┐   │
//!   ──────────────┼─▶│ security │──▶│  handlers │──▶│  upstream  │───┼──▶ User API
//!                 │  │  chain   │   │  + views  │   │   client   │   │
//!   ◀─────────────┼──│          │◀──│           │◀──│            │◀──┼───
//!                 │  └──────────┘   └─────┬─────┘   └────────────┘   │
//!                 │                       │ AppError                 │
//!                 │                 ┌─────▼──────┐                   │
//!                 │                 │   error    │                   │
//!                 │                 │  pipeline  │                   │
//!                 │                 └────────────┘                   │
//!                 │  config · observability · lifecycle              │
//!                 └──────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use user_frontend::config::{self, AppConfig};
use user_frontend::http::FrontendServer;
use user_frontend::lifecycle::{signals, startup, Lifecycle};
use user_frontend::observability::{logging, metrics};
use user_frontend::upstream::HttpApiClient;

#[tokio::main]
async fn main() {
    let code = run().await;
    std::process::exit(code);
}

async fn run() -> i32 {
    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            // Logging settings come from the same environment.
            if logging::init_logging(&AppConfig::default()).is_ok() {
                tracing::error!(error = %e, "Invalid configuration");
            } else {
                eprintln!("Invalid configuration: {e}");
            }
            return 1;
        }
    };

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Failed to initialize logging: {e:#}");
        return 1;
    }
    startup::install_fatal_panic_hook();

    tracing::info!(
        env = %config.environment,
        log_level = ?config.log_level,
        "user-frontend v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if let Some(addr) = config.metrics_address {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, metrics_address = %addr, "Failed to start metrics exporter");
            return 1;
        }
    }

    let api = match HttpApiClient::new(config.api_url.clone(), config.request_timeout) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build upstream client");
            return 1;
        }
    };

    let lifecycle = Arc::new(Lifecycle::new(config.shutdown_timeout));
    signals::spawn_signal_listener(lifecycle.clone());

    let listener = match startup::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = ?e, "Failed to bind listener");
            return 1;
        }
    };

    let server = FrontendServer::new(config, Arc::new(api));
    match server.run(listener, &lifecycle).await {
        Ok(outcome) => {
            tracing::info!(outcome = ?outcome, "Shutdown complete");
            outcome.exit_code()
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            1
        }
    }
}

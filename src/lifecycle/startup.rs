//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the fatal panic hook before anything can panic
//! - Bind the listener last, so traffic only arrives once ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A panic anywhere is logged as fatal and ends the process with code 1

use std::net::SocketAddr;
use std::panic::{self, PanicHookInfo};

use anyhow::Context;
use tokio::net::TcpListener;

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Treat any panic as an unrecoverable fault: log it, then exit with code 1.
pub fn install_fatal_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(
            fatal = true,
            location = %location,
            panic = %panic_message(info),
            "Uncaught panic, exiting"
        );
        std::process::exit(1);
    }));
}

/// Bind the TCP listener.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))
}

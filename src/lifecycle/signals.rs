//! OS signal handling.
//!
//! SIGTERM and SIGINT both start a graceful drain. A second signal is
//! ignored; the drain deadline bounds how long the process lingers.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::lifecycle::Lifecycle;

/// Termination signal handlers, registered with the OS on creation.
///
/// Until they are registered a SIGTERM still kills the process outright,
/// so create them before the listener starts accepting.
pub struct TerminationSignals {
    #[cfg(unix)]
    unix: Option<(tokio::signal::unix::Signal, tokio::signal::unix::Signal)>,
}

impl TerminationSignals {
    /// Register handlers. Must be called inside a tokio runtime.
    pub fn install() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let unix = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => Some((term, int)),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "Failed to install unix signal handlers, falling back to ctrl-c");
                    None
                }
            };
            Self { unix }
        }

        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    /// Wait for the first termination signal and return its name.
    pub async fn recv(self) -> &'static str {
        #[cfg(unix)]
        {
            if let Some((mut term, mut int)) = self.unix {
                return tokio::select! {
                    _ = term.recv() => "SIGTERM",
                    _ = int.recv() => "SIGINT",
                };
            }
        }

        ctrl_c().await
    }
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl-c; shutdown only via process kill");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}

/// Start draining `lifecycle` when the process is asked to terminate.
///
/// Handlers are registered before this returns.
pub fn spawn_signal_listener(lifecycle: Arc<Lifecycle>) -> JoinHandle<()> {
    let signals = TerminationSignals::install();
    tokio::spawn(async move {
        let signal = signals.recv().await;
        tracing::info!(signal, "Received shutdown signal");
        lifecycle.begin_drain();
    })
}

//! Shutdown coordination for the frontend.

use std::future::IntoFuture;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the process is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Listening,
    Draining,
    Stopped,
}

impl Phase {
    fn is_running(self) -> bool {
        matches!(self, Phase::Starting | Phase::Listening)
    }
}

/// How serving ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight connection finished before the deadline.
    Drained,
    /// The drain deadline passed with connections still open.
    Forced,
}

impl DrainOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            DrainOutcome::Drained => 0,
            DrainOutcome::Forced => 1,
        }
    }
}

/// Process lifecycle: phase tracking plus a bounded graceful drain.
///
/// The phase lives in a watch channel so a drain requested before the
/// server starts listening is never missed.
pub struct Lifecycle {
    shutdown: Shutdown,
    phase: watch::Sender<Phase>,
    drain_timeout: Duration,
}

impl Lifecycle {
    pub fn new(drain_timeout: Duration) -> Self {
        let (phase, _) = watch::channel(Phase::Starting);
        Self {
            shutdown: Shutdown::new(),
            phase,
            drain_timeout,
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Observe phase transitions.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Shutdown notification for background tasks.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown.subscribe()
    }

    /// Stop accepting connections and start draining. Idempotent.
    pub fn begin_drain(&self) {
        let changed = self.phase.send_if_modified(|phase| {
            if phase.is_running() {
                *phase = Phase::Draining;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::info!(
                timeout_ms = self.drain_timeout.as_millis() as u64,
                "Graceful shutdown started, draining connections"
            );
            self.shutdown.trigger();
        }
    }

    /// Serve `app` on `listener` until a drain completes or times out.
    ///
    /// The drain deadline starts when [`begin_drain`](Self::begin_drain) is
    /// called; if connections are still open when it passes the outcome is
    /// [`DrainOutcome::Forced`].
    pub async fn serve(&self, listener: TcpListener, app: Router) -> io::Result<DrainOutcome> {
        self.phase.send_if_modified(|phase| {
            if *phase == Phase::Starting {
                *phase = Phase::Listening;
                true
            } else {
                false
            }
        });

        let mut drain_signal = self.phase.subscribe();
        let graceful = async move {
            let _ = drain_signal.wait_for(|phase| !phase.is_running()).await;
        };

        let mut ceiling_signal = self.phase.subscribe();
        let drain_timeout = self.drain_timeout;
        let ceiling = async move {
            let _ = ceiling_signal.wait_for(|phase| !phase.is_running()).await;
            tokio::time::sleep(drain_timeout).await;
        };

        let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(graceful)
            .into_future();

        let outcome = tokio::select! {
            result = server => result.map(|()| DrainOutcome::Drained),
            () = ceiling => {
                tracing::error!(
                    timeout_ms = drain_timeout.as_millis() as u64,
                    "Could not close connections in time, forcefully shutting down"
                );
                Ok(DrainOutcome::Forced)
            }
        };

        self.phase.send_replace(Phase::Stopped);
        outcome
    }
}

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Initialize logging/metrics → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Drain requested → Stop accepting → Drain connections → Exit 0
//!                                      └─ deadline passed ──→ Exit 1
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Begin graceful drain
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listener
//! - Shutdown has timeout: forced exit after deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{DrainOutcome, Lifecycle, Phase, Shutdown};

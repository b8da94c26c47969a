//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → logging.rs (correlation span, access line, header redaction)
//!     → metrics.rs (counters, latency histogram)
//!
//! Consumers:
//!     → stdout (pretty in development, JSON elsewhere)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request via its span
//! - Metrics are cheap (atomic increments) and no-ops without an exporter

pub mod logging;
pub mod metrics;

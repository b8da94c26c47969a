//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request, in this order:
//!     → headers.rs (hardening headers on the way out)
//!     → cors.rs (origin policy, preflight)
//!     → rate_limit.rs (per-client fixed window)
//!     → compression.rs (opt-out, then compression)
//!     → [error pipeline]
//!     → limits.rs (request body size)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - The order is fixed and assembled in one place (`http::server`)
//! - Fail closed: any rejecting step short-circuits the chain

pub mod compression;
pub mod cors;
pub mod headers;
pub mod limits;
pub mod rate_limit;

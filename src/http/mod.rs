//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router, middleware chain)
//!     → handlers.rs (validate, call upstream)
//!     → views.rs (render HTML)
//!     → error.rs (log + render failures)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod server;
pub mod views;

pub use error::AppError;
pub use server::{AppState, FrontendServer, HEALTH_PATH};

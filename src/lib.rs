//! User management web frontend library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;
pub mod users;

pub use config::AppConfig;
pub use http::FrontendServer;
pub use lifecycle::{Lifecycle, Shutdown};

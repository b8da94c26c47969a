//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (read variables into RawConfig)
//!     → validation.rs (parse & semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared by value / Arc with all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Every variable has a default so an empty environment boots
//! - Any invalid value is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from, ConfigError};
pub use schema::{AppConfig, CorsOrigin, Environment, LogLevel, RateLimitConfig, RawConfig};
pub use validation::ValidationError;

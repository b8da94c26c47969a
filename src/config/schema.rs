//! Configuration schema definitions.
//!
//! [`RawConfig`] mirrors the process environment one-to-one (every value is
//! still a string). [`AppConfig`] is the validated, typed result shared by
//! all subsystems.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Environment variables as read from the process, before validation.
///
/// Field names are the lower-cased variable names; unset variables take the
/// defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub app_env: String,
    pub port: String,
    pub api_url: String,
    pub log_level: String,
    pub trust_proxy: String,
    pub cors_origin: String,
    pub rate_limit_window_ms: String,
    pub rate_limit_max_requests: String,
    pub request_timeout_ms: String,
    pub body_limit: String,
    pub metrics_address: String,
    pub shutdown_timeout_ms: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            app_env: "development".to_string(),
            port: "3000".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            log_level: "info".to_string(),
            trust_proxy: "false".to_string(),
            cors_origin: "*".to_string(),
            rate_limit_window_ms: "900000".to_string(),
            rate_limit_max_requests: "100".to_string(),
            request_timeout_ms: "30000".to_string(),
            body_limit: "10mb".to_string(),
            metrics_address: String::new(),
            shutdown_timeout_ms: "10000".to_string(),
        }
    }
}

const DEFAULT_API_URL: &str = "http://flask-api:5000";

/// Validated application configuration. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,

    /// Listen port (bound on all interfaces).
    pub port: u16,

    /// Upstream API base URL, without trailing slash.
    pub api_url: String,

    pub log_level: LogLevel,

    /// Trust one proxy hop when identifying clients.
    pub trust_proxy: bool,

    pub cors_origin: CorsOrigin,

    pub rate_limit: RateLimitConfig,

    /// Deadline for every upstream API call.
    pub request_timeout: Duration,

    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,

    /// Prometheus exporter address. `None` disables the exporter.
    pub metrics_address: Option<SocketAddr>,

    /// Ceiling on connection draining after a termination signal.
    pub shutdown_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            port: 3000,
            api_url: DEFAULT_API_URL.to_string(),
            log_level: LogLevel::Info,
            trust_proxy: false,
            cors_origin: CorsOrigin::Any,
            rate_limit: RateLimitConfig::default(),
            request_timeout: Duration::from_millis(30_000),
            body_limit: 10 * 1024 * 1024,
            metrics_address: None,
            shutdown_timeout: Duration::from_millis(10_000),
        }
    }
}

impl AppConfig {
    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

/// Fixed-window rate limiting settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(900_000),
            max_requests: 100,
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log verbosity as accepted in `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    ///
    /// `tracing` has no fatal level; fatal events are logged at error.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Fatal | LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fatal" => Ok(LogLevel::Fatal),
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(()),
        }
    }
}

/// Origins allowed to make cross-origin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigin {
    /// `*`: reflect whatever origin the request carries.
    Any,
    /// Explicit allow-list.
    List(Vec<String>),
}

impl CorsOrigin {
    pub fn parse(value: &str) -> Self {
        if value.trim() == "*" {
            return CorsOrigin::Any;
        }
        CorsOrigin::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Parse a human-readable size such as `10mb`, `512kb`, `1.5mb` or `2048`.
///
/// Units are binary (1kb = 1024 bytes) and case-insensitive; a bare number
/// is a byte count.
pub fn parse_byte_size(value: &str) -> Option<usize> {
    let value = value.trim().to_ascii_lowercase();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().ok()?;

    let multiplier: f64 = match unit.trim() {
        "" | "b" => 1.0,
        "kb" => 1024.0,
        "mb" => 1024.0 * 1024.0,
        "gb" => 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };

    let bytes = (number * multiplier).floor();
    if !bytes.is_finite() || bytes < 0.0 || bytes > usize::MAX as f64 {
        return None;
    }
    Some(bytes as usize)
}

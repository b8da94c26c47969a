//! Configuration validation.
//!
//! # Responsibilities
//! - Parse every raw environment value into its typed form
//! - Validate value ranges (port, windows and timeouts > 0)
//! - Check the upstream URL is an absolute http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RawConfig → Result<AppConfig, Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::{
    parse_byte_size, AppConfig, CorsOrigin, Environment, LogLevel, RateLimitConfig, RawConfig,
};

/// A single rejected environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{variable}: {message}")]
pub struct ValidationError {
    pub variable: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(variable: &'static str, message: impl Into<String>) -> Self {
        Self {
            variable,
            message: message.into(),
        }
    }
}

/// Validate raw values and build the typed configuration.
pub fn validate_config(raw: &RawConfig) -> Result<AppConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let defaults = AppConfig::default();

    let environment = raw.app_env.trim().parse::<Environment>().unwrap_or_else(|_| {
        errors.push(ValidationError::new(
            "APP_ENV",
            format!(
                "expected one of development, production, test; got {:?}",
                raw.app_env
            ),
        ));
        defaults.environment
    });

    let port = match raw.port.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => {
            errors.push(ValidationError::new(
                "PORT",
                format!("expected a port between 1 and 65535; got {:?}", raw.port),
            ));
            defaults.port
        }
    };

    let api_url = match Url::parse(raw.api_url.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            url.as_str().trim_end_matches('/').to_string()
        }
        _ => {
            errors.push(ValidationError::new(
                "API_URL",
                format!("expected an absolute http(s) URL; got {:?}", raw.api_url),
            ));
            defaults.api_url.clone()
        }
    };

    let log_level = raw.log_level.trim().parse::<LogLevel>().unwrap_or_else(|_| {
        errors.push(ValidationError::new(
            "LOG_LEVEL",
            format!(
                "expected one of fatal, error, warn, info, debug, trace; got {:?}",
                raw.log_level
            ),
        ));
        defaults.log_level
    });

    let trust_proxy = parse_bool(&raw.trust_proxy).unwrap_or_else(|| {
        errors.push(ValidationError::new(
            "TRUST_PROXY",
            format!("expected a boolean; got {:?}", raw.trust_proxy),
        ));
        defaults.trust_proxy
    });

    let cors_origin = CorsOrigin::parse(&raw.cors_origin);
    if let CorsOrigin::List(origins) = &cors_origin {
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            errors.push(ValidationError::new(
                "CORS_ORIGIN",
                "expected `*` alone or a comma-separated list of origins",
            ));
        }
    }

    let window = positive_millis(&raw.rate_limit_window_ms, "RATE_LIMIT_WINDOW_MS", &mut errors)
        .unwrap_or(defaults.rate_limit.window);

    let max_requests = match raw.rate_limit_max_requests.trim().parse::<u32>() {
        Ok(max) if max > 0 => max,
        _ => {
            errors.push(ValidationError::new(
                "RATE_LIMIT_MAX_REQUESTS",
                format!(
                    "expected a positive integer; got {:?}",
                    raw.rate_limit_max_requests
                ),
            ));
            defaults.rate_limit.max_requests
        }
    };

    let request_timeout = positive_millis(&raw.request_timeout_ms, "REQUEST_TIMEOUT_MS", &mut errors)
        .unwrap_or(defaults.request_timeout);

    let body_limit = match parse_byte_size(&raw.body_limit) {
        Some(limit) if limit > 0 => limit,
        _ => {
            errors.push(ValidationError::new(
                "BODY_LIMIT",
                format!("expected a size such as 10mb or 512kb; got {:?}", raw.body_limit),
            ));
            defaults.body_limit
        }
    };

    let metrics_address = match raw.metrics_address.trim() {
        "" => None,
        value => match value.parse::<SocketAddr>() {
            Ok(addr) => Some(addr),
            Err(_) => {
                errors.push(ValidationError::new(
                    "METRICS_ADDRESS",
                    format!("expected a socket address such as 0.0.0.0:9090; got {value:?}"),
                ));
                None
            }
        },
    };

    let shutdown_timeout =
        positive_millis(&raw.shutdown_timeout_ms, "SHUTDOWN_TIMEOUT_MS", &mut errors)
            .unwrap_or(defaults.shutdown_timeout);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(AppConfig {
        environment,
        port,
        api_url,
        log_level,
        trust_proxy,
        cors_origin,
        rate_limit: RateLimitConfig {
            window,
            max_requests,
        },
        request_timeout,
        body_limit,
        metrics_address,
        shutdown_timeout,
    })
}

fn positive_millis(
    value: &str,
    variable: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Option<Duration> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Some(Duration::from_millis(ms)),
        _ => {
            errors.push(ValidationError::new(
                variable,
                format!("expected a positive number of milliseconds; got {value:?}"),
            ));
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

//! Configuration loading from the process environment.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::schema::{AppConfig, RawConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load(config::Environment::default())
}

/// Load and validate configuration from an explicit variable map.
///
/// Keys are variable names as they would appear in the environment
/// (`PORT`, `API_URL`, ...).
pub fn load_config_from(vars: HashMap<String, String>) -> Result<AppConfig, ConfigError> {
    load(config::Environment::default().source(Some(vars.into_iter().collect())))
}

fn load(source: config::Environment) -> Result<AppConfig, ConfigError> {
    let raw: RawConfig = config::Config::builder()
        .add_source(source)
        .build()?
        .try_deserialize()?;

    validate_config(&raw).map_err(ConfigError::Validation)
}

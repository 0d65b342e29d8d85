//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{Credential, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `upstream.credential`.
pub const CREDENTIAL_ENV: &str = "RELAY_UPSTREAM_CREDENTIAL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&content)?;
    finalize(config)
}

/// Apply environment overrides and validate.
///
/// Used directly when the relay starts without a config file.
pub fn finalize(mut config: RelayConfig) -> Result<RelayConfig, ConfigError> {
    apply_env(&mut config, std::env::var(CREDENTIAL_ENV).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn apply_env(config: &mut RelayConfig, credential: Option<String>) {
    if let Some(value) = credential.filter(|v| !v.is_empty()) {
        config.upstream.credential = Credential::new(value);
    }
}

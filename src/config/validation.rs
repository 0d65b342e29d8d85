//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows and caps > 0, timeouts > 0)
//! - Keep the request deadline longer than the upstream deadline
//! - Check the upstream endpoint and credential are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.relay_path must start with '/' (got {0:?})")]
    RelayPath(String),

    #[error("client.user_agent_prefix must not be empty")]
    EmptyUserAgentPrefix,

    #[error("upstream.endpoint is not a valid http(s) URL: {0}")]
    Endpoint(String),

    #[error("upstream.credential must be set (file or RELAY_UPSTREAM_CREDENTIAL)")]
    MissingCredential,

    #[error("upstream.credential contains characters not allowed in a header")]
    InvalidCredential,

    #[error("upstream.timeout_secs must be greater than zero")]
    UpstreamTimeout,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error(
        "timeouts.request_secs ({request}) must exceed upstream.timeout_secs ({upstream})"
    )]
    TimeoutOrder { request: u64, upstream: u64 },

    #[error("at least one limit level must be configured")]
    NoLimitLevels,

    #[error("limits[{index}].{field} must be greater than zero")]
    LimitLevel { index: usize, field: &'static str },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.listener.relay_path.starts_with('/') {
        errors.push(ValidationError::RelayPath(config.listener.relay_path.clone()));
    }

    if config.client.user_agent_prefix.is_empty() {
        errors.push(ValidationError::EmptyUserAgentPrefix);
    }

    match Url::parse(&config.upstream.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::Endpoint(format!(
            "unsupported scheme {}",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::Endpoint(e.to_string())),
    }

    let credential = &config.upstream.credential;
    if credential.is_empty() {
        errors.push(ValidationError::MissingCredential);
    } else if HeaderValue::from_str(credential.expose()).is_err() {
        errors.push(ValidationError::InvalidCredential);
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::UpstreamTimeout);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    // The whole-request deadline must outlast the upstream one, or a slow
    // upstream surfaces as a bare 408 instead of the relay's 502.
    let (request, upstream) = (config.timeouts.request_secs, config.upstream.timeout_secs);
    if request != 0 && upstream != 0 && request <= upstream {
        errors.push(ValidationError::TimeoutOrder { request, upstream });
    }

    if config.limits.0.is_empty() {
        errors.push(ValidationError::NoLimitLevels);
    }
    for (index, level) in config.limits.0.iter().enumerate() {
        if level.window_secs == 0 {
            errors.push(ValidationError::LimitLevel { index, field: "window_secs" });
        }
        if level.max_calls_per_caller == 0 {
            errors.push(ValidationError::LimitLevel { index, field: "max_calls_per_caller" });
        }
        if level.max_total_callers == 0 {
            errors.push(ValidationError::LimitLevel { index, field: "max_total_callers" });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

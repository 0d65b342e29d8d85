//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, relay path).
    pub listener: ListenerConfig,

    /// Requirements placed on calling clients.
    pub client: ClientConfig,

    /// The credentialed text-to-speech service being relayed.
    pub upstream: UpstreamConfig,

    /// Admission levels. Every level must admit a call for it to proceed.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path the relay endpoint is mounted on.
    pub relay_path: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            relay_path: "/api/voicetext".to_string(),
        }
    }
}

/// Client identification requirements.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefix the `User-Agent` header must start with.
    pub user_agent_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent_prefix: "AwesomeTTS/".to_string(),
        }
    }
}

/// Upstream service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Endpoint every relayed call is sent to.
    pub endpoint: String,

    /// Value sent in the `Authorization` header.
    pub credential: Credential,

    /// Bound on the whole upstream exchange, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.voicetext.jp/v1/tts".to_string(),
            credential: Credential::default(),
            timeout_secs: 10,
        }
    }
}

/// Upstream authorization value. Never printed.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<unset>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// One sliding-window admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LimitLevelConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Calls a single caller may make within the window.
    pub max_calls_per_caller: u32,

    /// Distinct callers allowed within the window.
    pub max_total_callers: usize,
}

/// The set of admission levels, applied together.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LimitsConfig(pub Vec<LimitLevelConfig>);

impl Default for LimitsConfig {
    fn default() -> Self {
        Self(vec![
            // short and strict
            LimitLevelConfig {
                window_secs: 60,
                max_calls_per_caller: 25,
                max_total_callers: 5,
            },
            // long and lenient
            LimitLevelConfig {
                window_secs: 86_400,
                max_calls_per_caller: 500,
                max_total_callers: 100,
            },
        ])
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

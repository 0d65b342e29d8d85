//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → consumed once by HttpServer::new
//! ```
//!
//! # Design Decisions
//! - Config is fixed for the life of the process; there is no reload
//! - All fields have defaults to allow minimal configs
//! - The upstream credential can come from the environment so it stays out of files

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_config, ConfigError};
pub use schema::{
    ClientConfig, Credential, LimitLevelConfig, LimitsConfig, ListenerConfig,
    ObservabilityConfig, RelayConfig, TimeoutConfig, UpstreamConfig,
};

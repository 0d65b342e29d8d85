//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → validator.rs (caller address, user agent, method, query shape)
//!     → rate_limit.rs (multi-level admission transaction)
//!     → Pass to upstream
//! ```
//!
//! # Design Decisions
//! - Cheapest checks first; no lock is taken for junk requests
//! - Fail closed: reject on any security check failure
//! - Caller identity is the peer IP, which is not authenticated

pub mod rate_limit;
pub mod validator;

pub use rate_limit::{CallRecord, LevelUsage, RateLimiter, Rejection};
pub use validator::{InboundRequest, RequestValidator, ValidationError};

//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted request:
//!     → client.rs (POST query string to the fixed endpoint, 10s deadline)
//!     → status must be 200, content type must be audio/*
//!     → body and content type returned unmodified
//! ```
//!
//! # Design Decisions
//! - Single attempt; no retries, no caching
//! - Runs outside the admission lock
//! - Failure detail stays in the logs

pub mod client;

pub use client::{SetupError, UpstreamAudio, UpstreamClient, UpstreamError};

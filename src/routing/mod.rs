//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request for the relay path
//!     → http::relay (validation, admission, upstream)
//!
//! Request for any other path
//!     → unresolved.rs (fallback responder)
//!     → normalize.rs (clean up the path)
//!     → 301 to the cleaned path, or 404
//! ```
//!
//! # Design Decisions
//! - No regex in hot path
//! - Deterministic: same input always produces the same redirect

pub mod normalize;
pub mod unresolved;

pub use unresolved::unresolved;

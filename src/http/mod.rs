//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, peer address)
//!     → request.rs (assign request ID)
//!     → relay.rs (validate → admit → forward)
//!     → response.rs (status + JSON message, or audio passthrough)
//!     → Send to client
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::RelayError;
pub use server::{build_router, AppState, HttpServer};

//! The relay endpoint.
//!
//! # Request lifecycle
//! ```text
//! Start → Validating → RateLimiting → Proxying → Responded
//!             │             │             │
//!             └─────────────┴─────────────┴──→ Responded (rejection)
//! ```
//! Each request makes a single linear pass; there is no retry and no
//! backward transition. Only `RateLimiting` touches shared state, and it
//! releases the lock before `Proxying` begins.

use std::net::SocketAddr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::header::USER_AGENT;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::http::request::request_id;
use crate::http::response::RelayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::InboundRequest;

/// Validate, admit, forward, respond.
pub async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, _) = request.into_parts();
    let request_id = request_id(&parts.headers);

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let user_agent = parts.headers.get(USER_AGENT).and_then(|v| v.to_str().ok());

    let inbound = InboundRequest {
        method: &parts.method,
        remote_addr: peer,
        user_agent,
        query: parts.uri.query(),
    };

    // Validating
    let query = match state.validator.validate(&inbound) {
        Ok(query) => query,
        Err(e) => {
            tracing::warn!(request_id = %request_id, reason = %e, "Relay denied");
            return reject(RelayError::from(e));
        }
    };
    // Validation guarantees an address; the key is only built for admitted shapes.
    let caller = peer.map(|ip| ip.to_string()).unwrap_or_default();

    // RateLimiting
    let usage = match state.limiter.admit(&caller, unix_now()) {
        Ok(usage) => usage,
        Err(rejection) => {
            tracing::warn!(
                request_id = %request_id,
                caller = %caller,
                reason = %rejection,
                "Relay denied"
            );
            return reject(RelayError::from(&rejection));
        }
    };
    metrics::record_usage(&usage);
    tracing::info!(
        request_id = %request_id,
        caller = %caller,
        "Relay accepted -- {}",
        usage
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    );

    // Proxying
    let start = Instant::now();
    let result = state.upstream.forward(query).await;
    metrics::record_upstream(start);

    match result {
        Ok(audio) => {
            tracing::debug!(
                request_id = %request_id,
                content_type = ?audio.content_type,
                bytes = audio.body.len(),
                "Relay succeeded"
            );
            metrics::record_outcome("ok");
            audio.into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Relay failed");
            reject(RelayError::from(&e))
        }
    }
}

fn reject(err: RelayError) -> Response {
    metrics::record_outcome(err.outcome());
    err.into_response()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay endpoint and fallback responder
//! - Wire up middleware (tracing, timeout, request ID)
//! - Own the process-wide admission state
//! - Bind server to listener with peer address info

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::relay::relay_handler;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::ShutdownSignal;
use crate::routing::unresolved;
use crate::security::{RateLimiter, RequestValidator};
use crate::upstream::{SetupError, UpstreamClient};

/// Application state injected into handlers.
///
/// Built once at startup; the limiter inside is the only mutable state
/// shared between requests.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<RequestValidator>,
    pub limiter: Arc<RateLimiter>,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn from_config(config: &RelayConfig) -> Result<Self, SetupError> {
        Ok(Self {
            validator: Arc::new(RequestValidator::new(
                config.client.user_agent_prefix.clone(),
            )),
            limiter: Arc::new(RateLimiter::new(&config.limits.0)),
            upstream: Arc::new(UpstreamClient::new(&config.upstream)?),
        })
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, SetupError> {
        let state = AppState::from_config(&config)?;
        let router = build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            relay_path = %self.config.listener.relay_path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &RelayConfig, state: AppState) -> Router {
    Router::new()
        .route(&config.listener.relay_path, any(relay_handler))
        .fallback(unresolved)
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

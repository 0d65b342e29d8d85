//! Upstream text-to-speech client with timeout and error handling.
//!
//! # Responsibilities
//! - Send one credentialed call per relayed request
//! - Bound the whole exchange (connect, headers, body) by a deadline
//! - Accept only `200` responses carrying `audio/*` content

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use thiserror::Error;
use tokio::time::timeout;
use url::Url;

use crate::config::UpstreamConfig;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Errors that can occur while building the client.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid upstream endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("upstream credential is not a valid header value")]
    Credential,

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors that can occur during an upstream call.
///
/// These carry detail for the logs only; callers of the relay never see it.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream timeout after {0} seconds")]
    Timeout(u64),

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("non-200 status code from upstream service: {0}")]
    Status(StatusCode),

    #[error("non-audio format from upstream service: {0:?}")]
    ContentType(String),
}

/// Audio returned by the upstream, passed through untouched.
#[derive(Debug, Clone)]
pub struct UpstreamAudio {
    pub content_type: HeaderValue,
    pub body: Bytes,
}

/// The single fixed upstream endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: Url,
    authorization: HeaderValue,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, SetupError> {
        let endpoint = Url::parse(&config.endpoint)?;

        let mut authorization = HeaderValue::from_str(config.credential.expose())
            .map_err(|_| SetupError::Credential)?;
        authorization.set_sensitive(true);

        let http = reqwest::Client::builder().no_proxy().build()?;

        Ok(Self {
            http,
            endpoint,
            authorization,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Forward `payload` (the caller's query string) as the request body.
    ///
    /// Exactly one attempt is made. The response is dropped on every exit
    /// path, returning its connection whether or not the body was read.
    pub async fn forward(&self, payload: &str) -> Result<UpstreamAudio, UpstreamError> {
        match timeout(self.timeout, self.exchange(payload)).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn exchange(&self, payload: &str) -> Result<UpstreamAudio, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(payload.to_owned())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpstreamError::Status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(""));
        if !is_audio(&content_type) {
            let observed = String::from_utf8_lossy(content_type.as_bytes()).into_owned();
            return Err(UpstreamError::ContentType(observed));
        }

        let body = response.bytes().await?;
        Ok(UpstreamAudio { content_type, body })
    }
}

/// `audio/*`, judged on the media type alone (case-insensitive, parameters ignored).
fn is_audio(content_type: &HeaderValue) -> bool {
    content_type
        .to_str()
        .ok()
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase().starts_with("audio/"))
        .unwrap_or(false)
}

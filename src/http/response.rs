//! Relay outcomes as HTTP responses.
//!
//! # Responsibilities
//! - Map every failure kind to one status and one fixed message
//! - Render failures as compact JSON `{"message": ...}`
//! - Pass successful audio through with the upstream content type
//!
//! # Design Decisions
//! - Messages are generic; no input, state, or upstream detail is echoed
//! - One exhaustive match decides status and message

use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::security::{Rejection, ValidationError};
use crate::upstream::{UpstreamAudio, UpstreamError};

pub const MSG_CAPACITY: &str = "This service is over capacity";
pub const MSG_DENIED: &str = "You may not call this endpoint directly";
pub const MSG_TOO_MANY: &str = "You have made too many calls to the service";
pub const MSG_UNACCEPTABLE: &str = "Your request is unacceptable";
pub const MSG_UPSTREAM: &str = "Cannot communicate with upstream service";

/// Terminal failure of a relay request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    Denied,
    MethodNotAllowed,
    MalformedRequest,
    OverCapacity,
    RateExceeded,
    UpstreamUnavailable,
}

impl RelayError {
    pub fn status(self) -> StatusCode {
        self.parts().0
    }

    pub fn message(self) -> &'static str {
        self.parts().1
    }

    /// Short label used for logs and metrics.
    pub fn outcome(self) -> &'static str {
        match self {
            RelayError::Denied => "denied",
            RelayError::MethodNotAllowed => "method_not_allowed",
            RelayError::MalformedRequest => "malformed_request",
            RelayError::OverCapacity => "over_capacity",
            RelayError::RateExceeded => "rate_exceeded",
            RelayError::UpstreamUnavailable => "upstream_unavailable",
        }
    }

    fn parts(self) -> (StatusCode, &'static str) {
        match self {
            RelayError::Denied => (StatusCode::FORBIDDEN, MSG_DENIED),
            RelayError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, MSG_UNACCEPTABLE),
            RelayError::MalformedRequest => (StatusCode::BAD_REQUEST, MSG_UNACCEPTABLE),
            RelayError::OverCapacity => (StatusCode::SERVICE_UNAVAILABLE, MSG_CAPACITY),
            RelayError::RateExceeded => (StatusCode::TOO_MANY_REQUESTS, MSG_TOO_MANY),
            RelayError::UpstreamUnavailable => (StatusCode::BAD_GATEWAY, MSG_UPSTREAM),
        }
    }
}

impl From<ValidationError> for RelayError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingAddress | ValidationError::UnauthorizedClient => {
                RelayError::Denied
            }
            ValidationError::MethodNotAllowed => RelayError::MethodNotAllowed,
            ValidationError::MalformedQuery => RelayError::MalformedRequest,
        }
    }
}

impl From<&Rejection> for RelayError {
    fn from(rejection: &Rejection) -> Self {
        match rejection {
            Rejection::OverCapacity { .. } => RelayError::OverCapacity,
            Rejection::TooManyCalls { .. } => RelayError::RateExceeded,
        }
    }
}

impl From<&UpstreamError> for RelayError {
    fn from(_: &UpstreamError) -> Self {
        RelayError::UpstreamUnavailable
    }
}

/// JSON body shared by every non-audio response.
#[derive(Debug, Serialize)]
pub struct MessageBody<'a> {
    pub message: &'a str,
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();
        (status, Json(MessageBody { message })).into_response()
    }
}

impl IntoResponse for UpstreamAudio {
    fn into_response(self) -> Response {
        ([(CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

//! Cheap structural checks on inbound relay requests.
//!
//! # Responsibilities
//! - Require a caller address and a recognised client `User-Agent`
//! - Require `GET`
//! - Coarse-filter the query string before any lock is taken
//!
//! # Design Decisions
//! - Substring and length checks only; the upstream does real validation
//! - First failing check wins, in a fixed order
//! - Nothing here allocates on the rejection path

use std::net::IpAddr;

use axum::http::Method;
use thiserror::Error;

/// Query strings at or above this many bytes are refused.
///
/// Most Japanese characters percent-encode to 9 bytes and clients send up
/// to 100 characters of text.
pub const MAX_QUERY_LEN: usize = 1000;

const REQUIRED_PARAMS: [&str; 5] = ["pitch=", "speaker=", "speed=", "text=", "volume="];

/// The parts of a request the validator looks at.
#[derive(Debug, Clone, Copy)]
pub struct InboundRequest<'a> {
    pub method: &'a Method,
    pub remote_addr: Option<IpAddr>,
    pub user_agent: Option<&'a str>,
    pub query: Option<&'a str>,
}

/// Why a request was refused before admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no remote IP address")]
    MissingAddress,

    #[error("unauthorized user agent")]
    UnauthorizedClient,

    #[error("unacceptable request method")]
    MethodNotAllowed,

    #[error("unacceptable query string")]
    MalformedQuery,
}

#[derive(Debug, Clone)]
pub struct RequestValidator {
    user_agent_prefix: String,
}

impl RequestValidator {
    pub fn new(user_agent_prefix: impl Into<String>) -> Self {
        Self {
            user_agent_prefix: user_agent_prefix.into(),
        }
    }

    /// Returns the query string to forward if every check passes.
    pub fn validate<'a>(&self, req: &InboundRequest<'a>) -> Result<&'a str, ValidationError> {
        if req.remote_addr.is_none() {
            return Err(ValidationError::MissingAddress);
        }

        if !req
            .user_agent
            .is_some_and(|ua| ua.starts_with(&self.user_agent_prefix))
        {
            return Err(ValidationError::UnauthorizedClient);
        }

        if req.method != Method::GET {
            return Err(ValidationError::MethodNotAllowed);
        }

        match req.query {
            Some(query) if query_is_acceptable(query) => Ok(query),
            _ => Err(ValidationError::MalformedQuery),
        }
    }
}

fn query_is_acceptable(query: &str) -> bool {
    !query.is_empty()
        && query.len() < MAX_QUERY_LEN
        && count(query, b'&') > 4
        && count(query, b'=') < 8
        && query.contains("format=")
        && !query.contains("format=wav")
        && REQUIRED_PARAMS.iter().all(|param| query.contains(param))
}

fn count(haystack: &str, needle: u8) -> usize {
    haystack.bytes().filter(|&b| b == needle).count()
}

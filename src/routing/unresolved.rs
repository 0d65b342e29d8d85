//! Responder for requests that match no endpoint.
//!
//! A path that normalizes to something different is permanently redirected
//! there; anything else gets a JSON 404.

use axum::http::header::LOCATION;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::http::response::MessageBody;
use crate::routing::normalize::normalize;

pub const MSG_NOT_FOUND: &str = "No such endpoint";

/// Router fallback.
pub async fn unresolved(uri: Uri) -> Response {
    let path = uri.path();

    match normalize(path) {
        Some(new_path) => {
            tracing::warn!(from = %path, to = %new_path, "API redirect");
            let message = format!("Try {} instead", new_path);
            (
                StatusCode::MOVED_PERMANENTLY,
                [(LOCATION, new_path)],
                Json(MessageBody { message: &message }),
            )
                .into_response()
        }
        None => {
            tracing::error!(path = %path, "Nothing suitable; returning 404");
            (
                StatusCode::NOT_FOUND,
                Json(MessageBody {
                    message: MSG_NOT_FOUND,
                }),
            )
                .into_response()
        }
    }
}

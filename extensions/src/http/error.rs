use packsync_core::api::ApiError;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

/// Error body shapes the pack server is known to send. Anything else is kept as raw text.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum ErrorBody {
    Message { message: String },
    Error { error: String },
    Detail { detail: String },
}

impl ErrorBody {
    fn into_message(self) -> String {
        match self {
            ErrorBody::Message { message } => message,
            ErrorBody::Error { error } => error,
            ErrorBody::Detail { detail } => detail,
        }
    }
}

/// Turns a response with a non-success status into an [`ApiError`].
///
/// Returns `ApiError::Network` if even the body cannot be read.
pub(crate) async fn map_response_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    debug_assert!(!status.is_success(), "map_response_error called with success status");

    match response.text().await {
        Ok(body_text) => error_for_status(status, message_from_body(status, body_text)),
        Err(e) => {
            warn!(
                target: "packsync::api",
                status = %status,
                error = %e,
                "Failed to read error response body"
            );
            ApiError::Network(Box::new(e))
        }
    }
}

fn message_from_body(status: StatusCode, body_text: String) -> String {
    if body_text.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }
    match serde_json::from_str::<ErrorBody>(&body_text) {
        Ok(body) => body.into_message(),
        Err(_) => body_text,
    }
}

pub(crate) fn error_for_status(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message), // 401
        StatusCode::FORBIDDEN => ApiError::Forbidden(message),       // 403
        StatusCode::NOT_FOUND => ApiError::NotFound(message),        // 404
        _ => ApiError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Errors raised by reqwest before a status code was available, or while reading a
/// success body.
pub(crate) fn map_transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Parsing(Box::new(err))
    } else {
        ApiError::Network(Box::new(err))
    }
}

use axum::response::IntoResponse;
use serde_json::json;

/// Fallback text used when an error carries no message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred";

/// Canonical error type used across the server, upstream clients and the
/// playground client.
///
/// The `Display` text of every variant is the bare message: it is what ends up
/// in the `{"error": ...}` body returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum PlaygroundError {
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Internal(String),
}

impl PlaygroundError {
    /// HTTP status used when this error is returned from a route.
    ///
    /// Only client input errors map to 400. Upstream failures keep their
    /// status on the error value but are surfaced as 500 by the routes.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            PlaygroundError::InvalidRequest(_) => http::StatusCode::BAD_REQUEST,
            PlaygroundError::Config(_)
            | PlaygroundError::Upstream { .. }
            | PlaygroundError::Transport(_)
            | PlaygroundError::Internal(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to API callers, with a generic fallback for empty text.
    #[must_use]
    pub fn public_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            UNKNOWN_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Build a fresh JSON error response: `{"error": message}` with the given status.
#[must_use]
pub fn json_error_response(status: http::StatusCode, message: &str) -> axum::response::Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for PlaygroundError {
    fn into_response(self) -> axum::response::Response {
        json_error_response(self.status_code(), &self.public_message())
    }
}

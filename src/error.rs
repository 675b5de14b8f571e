//! Error types for gemini-relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Result type alias for gemini-relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gemini-relay.
///
/// Validation failures are rejected before any network activity. The three
/// remaining kinds cover the upstream call: credential acquisition, the
/// transport itself (network failure, timeout, non-2xx status), and a
/// response body that does not match the streamed candidate-chunk shape.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("token acquisition failed: {0}")]
    Auth(String),

    #[error("upstream request failed: {0}")]
    UpstreamTransport(String),

    #[error("unexpected upstream payload: {0}")]
    UpstreamFormat(String),
}

impl Error {
    /// Short kind tag used in structured log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "validation",
            Error::Auth(_) => "auth",
            Error::UpstreamTransport(_) => "upstream_transport",
            Error::UpstreamFormat(_) => "upstream_format",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Validation failures carry field detail back to the caller. Every
        // adapter failure collapses to one external status; the kind is only
        // distinguished in logs.
        let (status, message) = match &self {
            Error::Validation { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Invalid prediction request")
            }
            _ => (StatusCode::BAD_GATEWAY, "Gemini prediction failed"),
        };

        let body = serde_json::json!({
            "detail": {
                "message": message,
                "error": self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

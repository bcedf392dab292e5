//! Error taxonomy shared by the backend client, the streaming client and the
//! dashboard controller.
//!
//! Every remote call resolves to one of four outcomes:
//!
//! - [`Error::Network`]: no response was received (connection refused, DNS,
//!   aborted by the request timeout).
//! - [`Error::Api`]: a response arrived but it was non-2xx or its envelope
//!   carried `success: false`.
//! - [`Error::NotFound`]: the backend answered 404 for an entity id.
//! - [`Error::Validation`]: raised locally, before any request is sent.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Transport failure or timeout.
    #[error("Network error: {message}")]
    Network { message: String, timed_out: bool },

    /// The backend rejected the request.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Unknown entity id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client-side validation failure.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// True when the request was aborted by the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Network { timed_out: true, .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Error::Api {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: format!("invalid response body: {}", err),
            };
        }
        Error::Network {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Api { .. } => StatusCode::BAD_GATEWAY,
            Error::Network { .. } => StatusCode::GATEWAY_TIMEOUT,
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_flag() {
        let err = Error::Network {
            message: "operation timed out".to_string(),
            timed_out: true,
        };
        assert!(err.is_timeout());
        assert!(!Error::validation("name").is_timeout());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            Error::validation("bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("cam-9".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Api {
                status: 500,
                message: "boom".to_string()
            }
            .into_response()
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}

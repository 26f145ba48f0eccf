//! Error types shared by the catalog and sales clients.
//!
//! Every failure a backend call can produce lands in [`ApiError`]. Front ends
//! never retry; they show [`ApiError::user_message`] as a one-line notice and
//! carry on.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when calling either backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (no connectivity, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the raw body.
        message: String,
    },

    /// The server rejected the credentials (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The requested record does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The response body did not match the expected shape.
    #[error("parse error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request path could not be joined onto the base URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Input rejected client-side before sending.
    #[error("validation error: {0}")]
    Validation(String),
}

impl ApiError {
    /// Build an error from a non-success response status and its body.
    ///
    /// Bodies shaped like `{"error": "..."}` or `{"message": "..."}` have the
    /// message extracted; anything else is kept verbatim.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            _ => Self::Status {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status code, when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND.as_u16()),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::InvalidUrl(_) | Self::Validation(_) => None,
        }
    }

    /// One-line text suitable for a transient notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(err) if err.is_timeout() => "Network error: request timed out".to_string(),
            Self::Http(err) if err.is_connect() => {
                "Network error: could not reach the server".to_string()
            }
            Self::Http(err) => format!("Network error: {err}"),
            Self::Status { status, message } => format!("Error {status}: {message}"),
            Self::Unauthorized(message) => format!("Not authorized: {message}"),
            Self::NotFound(message) => format!("Not found: {message}"),
            Self::Decode(_) => "Unexpected response from the server".to_string(),
            Self::InvalidUrl(err) => format!("Invalid address: {err}"),
            Self::Validation(message) => message.clone(),
        }
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error body shapes used by the two backends.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_error_field() {
        let err = ApiError::from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error": "Stock insuficiente para el producto 4"}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.user_message(),
            "Error 400: Stock insuficiente para el producto 4"
        );
    }

    #[test]
    fn test_extracts_message_field() {
        let err = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "The title field is required."}"#,
        );
        assert!(matches!(
            err,
            ApiError::Status { status: 422, ref message } if message == "The title field is required."
        ));
    }

    #[test]
    fn test_plain_body_kept_verbatim() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "boom\n");
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }

    #[test]
    fn test_empty_body_uses_reason() {
        let err = ApiError::from_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(err.user_message(), "Error 503: Service Unavailable");
    }

    #[test]
    fn test_unauthorized_and_not_found() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"error":"bad password"}"#);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "bad password"));
        assert_eq!(err.status(), Some(401));

        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_decode_message_hides_details() {
        let decode = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = ApiError::Decode(decode);
        assert_eq!(err.user_message(), "Unexpected response from the server");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_validation_message_is_shown_as_is() {
        let err = ApiError::Validation("Please select a customer".to_string());
        assert_eq!(err.user_message(), "Please select a customer");
    }
}

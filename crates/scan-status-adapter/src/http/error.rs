/*
[INPUT]:  Error sources (HTTP, API status, serialization, URL, client settings)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the scan server adapter
#[derive(Error, Debug)]
pub enum ScanApiError {
    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Client settings rejected before any request was made
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScanApiError {
    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScanApiError::Api { status, .. } => Some(*status),
            ScanApiError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Check if the error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ScanApiError::Http(_) => true,
            ScanApiError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Check if error indicates the credential was rejected
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Create an API error from status code and message
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        ScanApiError::Api {
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, ScanApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case(StatusCode::BAD_GATEWAY, true)]
    #[case(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case(StatusCode::NOT_FOUND, false)]
    #[case(StatusCode::UNAUTHORIZED, false)]
    fn test_api_error_retryable(#[case] status: StatusCode, #[case] retryable: bool) {
        assert_eq!(ScanApiError::api_error(status, "body").is_retryable(), retryable);
    }

    #[test]
    fn test_config_error_not_retryable() {
        let err = ScanApiError::Config("limit must be greater than zero".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_is_auth_error() {
        assert!(ScanApiError::api_error(StatusCode::UNAUTHORIZED, "expired").is_auth_error());
        assert!(ScanApiError::api_error(StatusCode::FORBIDDEN, "inactive").is_auth_error());
        assert!(!ScanApiError::api_error(StatusCode::BAD_GATEWAY, "proxy").is_auth_error());
    }

    #[test]
    fn test_api_error_creation() {
        let err = ScanApiError::api_error(StatusCode::BAD_REQUEST, "Invalid limit");
        match err {
            ScanApiError::Api { status, ref message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid limit");
            }
            _ => panic!("Expected Api error variant"),
        }
        assert_eq!(err.status(), Some(400));
    }
}

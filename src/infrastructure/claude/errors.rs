//! Errors returned by the Anthropic Messages API.

use reqwest::StatusCode;
use thiserror::Error;

use super::types::ApiErrorResponse;

/// Errors that can occur when interacting with the Claude API
#[derive(Error, Debug)]
pub enum ClaudeApiError {
    /// No API key configured
    #[error("Anthropic API key is not configured")]
    MissingApiKey,

    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid or missing API key (HTTP 401)
    #[error("Invalid API key - authentication failed")]
    InvalidApiKey,

    /// Forbidden - permission denied (HTTP 403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found (HTTP 404)
    #[error("Resource not found")]
    NotFound,

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    /// API is temporarily overloaded (HTTP 529)
    #[error("API overloaded")]
    Overloaded,

    /// Server error from Claude API (HTTP 5xx)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// `error` event received mid-stream
    #[error("Stream error ({error_type}): {message}")]
    StreamError {
        /// Error type reported by the API
        error_type: String,
        /// Error message reported by the API
        message: String,
    },

    /// Network or connection error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unknown or unexpected error
    #[error("Unknown error ({0}): {1}")]
    UnknownError(StatusCode, String),
}

impl ClaudeApiError {
    /// Map a non-success response to an error, preferring the API's own message
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|r| r.error.message)
            .unwrap_or(body);

        match status.as_u16() {
            400 => Self::InvalidRequest(message),
            401 => Self::InvalidApiKey,
            403 => Self::Forbidden(message),
            404 => Self::NotFound,
            429 => Self::RateLimitExceeded,
            529 => Self::Overloaded,
            _ if status.is_server_error() => Self::ServerError(status, message),
            _ => Self::UnknownError(status, message),
        }
    }

    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded
                | Self::Overloaded
                | Self::ServerError(_, _)
                | Self::NetworkError(_)
        )
    }

    /// Returns true if this is a permanent error that should not be retried
    pub const fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::MissingApiKey
                | Self::InvalidRequest(_)
                | Self::InvalidApiKey
                | Self::Forbidden(_)
                | Self::NotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ClaudeApiError::RateLimitExceeded.is_transient());
        assert!(ClaudeApiError::Overloaded.is_transient());
        assert!(
            ClaudeApiError::ServerError(StatusCode::INTERNAL_SERVER_ERROR, "test".to_string())
                .is_transient()
        );
    }

    #[test]
    fn test_permanent_errors() {
        assert!(ClaudeApiError::InvalidRequest("test".to_string()).is_permanent());
        assert!(ClaudeApiError::InvalidApiKey.is_permanent());
        assert!(ClaudeApiError::MissingApiKey.is_permanent());
        assert!(ClaudeApiError::NotFound.is_permanent());
    }

    #[test]
    fn test_from_status_extracts_api_message() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"max_tokens too large"}}"#;
        match ClaudeApiError::from_status(StatusCode::BAD_REQUEST, body.to_string()) {
            ClaudeApiError::InvalidRequest(message) => assert_eq!(message, "max_tokens too large"),
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            ClaudeApiError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ClaudeApiError::InvalidApiKey
        ));
        assert!(matches!(
            ClaudeApiError::from_status(StatusCode::from_u16(529).unwrap(), String::new()),
            ClaudeApiError::Overloaded
        ));
        assert!(matches!(
            ClaudeApiError::from_status(StatusCode::BAD_GATEWAY, "upstream".to_string()),
            ClaudeApiError::ServerError(StatusCode::BAD_GATEWAY, _)
        ));
        assert!(matches!(
            ClaudeApiError::from_status(StatusCode::IM_A_TEAPOT, String::new()),
            ClaudeApiError::UnknownError(_, _)
        ));
    }
}

//! API client errors.

use thiserror::Error;

/// Errors the API client returns instead of an `Outcome`.
///
/// Upstream HTTP error statuses are not errors; they come back as
/// `Outcome::Failure`.
#[derive(Error, Debug)]
pub enum ApiClientError {
    /// Credentials are missing a required field
    #[error("Authentication is not configured: {0}")]
    AuthConfiguration(String),

    /// The OAuth2 token endpoint could not issue a token
    #[error("Token refresh failed: {0}")]
    AuthRefresh(String),

    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Method outside GET, POST, PUT, PATCH and DELETE
    #[error("Unsupported HTTP method: {0}")]
    InvalidMethod(String),

    /// Endpoint is not a path relative to the base URL
    #[error("Invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// Endpoint as given
        endpoint: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ApiClientError {
    /// True when the upstream host refused or could not accept the connection
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_connect())
    }

    /// True for failures that may succeed if the same request is repeated later
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_connect() || err.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_not_transient() {
        assert!(!ApiClientError::AuthConfiguration("token".to_string()).is_transient());
        assert!(!ApiClientError::InvalidMethod("TRACE".to_string()).is_transient());
        assert!(!ApiClientError::AuthRefresh("401".to_string()).is_connect());
    }

    #[test]
    fn test_invalid_endpoint_message() {
        let err = ApiClientError::InvalidEndpoint {
            endpoint: "users".to_string(),
            reason: "must start with '/'".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid endpoint \"users\": must start with '/'");
    }
}

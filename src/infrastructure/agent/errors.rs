//! Agent API errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Agent API failures
#[derive(Error, Debug)]
pub enum AgentError {
    /// Nothing is listening at the agent base URL
    #[error("Cannot connect to agent API server at {base_url}. Make sure it is running")]
    ConnectionRefused {
        /// Agent API base URL
        base_url: String,
        /// Underlying connect error
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response
    #[error("API server responded with {status}: {body}")]
    Status {
        /// Response status
        status: StatusCode,
        /// Response body text
        body: String,
    },

    /// Session creation succeeded without an id in the body
    #[error("Agent API returned no session id")]
    MissingSessionId,

    /// Any other transport failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl AgentError {
    pub(crate) fn from_send(err: reqwest::Error, base_url: &str) -> Self {
        if err.is_connect() {
            Self::ConnectionRefused {
                base_url: base_url.to_string(),
                source: err,
            }
        } else {
            Self::Network(err)
        }
    }
}

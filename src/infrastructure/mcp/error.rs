//! JSON-RPC level errors.

use thiserror::Error;

use super::types::{INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};

/// JSON-RPC level failures of an MCP server
#[derive(Error, Debug)]
pub enum McpError {
    /// Request line was not valid JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed JSON that is not a usable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unsupported method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Bad `tools/call` parameters
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Reading or writing the transport failed
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),
}

impl McpError {
    /// JSON-RPC error code for this failure
    pub const fn code(&self) -> i32 {
        match self {
            Self::Parse(_) => PARSE_ERROR,
            Self::InvalidRequest(_) | Self::Transport(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
        }
    }
}

/// Result type alias for MCP operations
pub type Result<T> = std::result::Result<T, McpError>;

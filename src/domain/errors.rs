//! Domain errors shared between the relay, the tool registry and the MCP servers.

use thiserror::Error;

/// Failure to resolve or run a tool.
///
/// These are reported inline to the caller (as a relay notice or an MCP
/// `isError` result), never propagated as a process failure.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("Unknown tool \"{0}\"")]
    NotFound(String),

    /// Parameters were not JSON or failed the tool's schema
    #[error("Invalid parameters for tool \"{tool}\": {reason}")]
    Validation {
        /// Tool name
        tool: String,
        /// Why the parameters were rejected
        reason: String,
    },

    /// The tool ran and failed
    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    /// Parameters for `tool` were rejected
    pub fn validation(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// The tool ran and failed
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        Self::Execution(err.to_string())
    }
}

//! MCP (Model Context Protocol) tool servers
//!
//! - `ApiToolProvider`: the authenticated API client as MCP tools
//! - `InsightsToolProvider`: Docker Desktop insights metrics
//!
//! Both are served by [`McpServer`] over stdio (for MCP hosts that spawn the
//! process) or over HTTP `POST /`.

pub mod error;
pub mod handlers;
pub mod server;
pub mod types;

pub use error::{McpError, Result};
pub use handlers::{ApiToolProvider, InsightsToolProvider};
pub use server::{McpServer, ToolProvider};

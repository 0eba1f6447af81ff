//! Infrastructure layer module
//!
//! External integrations and adapters:
//! - Authenticated, rate-limited, cached API client
//! - Claude streaming client and SSE framing
//! - Local agent API client
//! - MCP tool servers
//! - HTTP server
//! - Configuration and logging
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod agent;
pub mod claude;
pub mod config;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod sse;
pub mod web;

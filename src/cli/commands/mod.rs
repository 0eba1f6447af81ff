//! CLI command implementations.

pub mod chat;
pub mod mcp;
pub mod serve;

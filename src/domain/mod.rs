//! Domain layer for apirelay
//!
//! Core models (configuration, credentials, request outcomes, tool calls)
//! and the port traits infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::ToolError;

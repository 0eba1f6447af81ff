//! Client for the local agent API

pub mod client;
pub mod errors;

pub use client::{AgentClient, AgentClientConfig};
pub use errors::AgentError;

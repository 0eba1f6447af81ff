//! apirelay
//!
//! Thin integration layers around external HTTP APIs:
//!
//! - a rate-limited, cached, credential-refreshing API client
//! - a streaming chat relay that resolves one embedded tool call per reply
//! - MCP tool servers over that client
//! - an HTTP gateway to a local agent process
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): relay, tool registry, insights, gateway
//! - **Infrastructure Layer** (`infrastructure`): HTTP clients, MCP, web, config, logging
//! - **CLI Layer** (`cli`): command-line interface

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::models::{Config, Credentials, Outcome};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::http::{ApiClient, ApiClientConfig};
pub use services::{StreamingRelay, ToolRegistry};

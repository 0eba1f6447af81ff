//! Tool providers served by the MCP servers

pub mod api;
pub mod insights;

pub use api::{ApiToolProvider, API_SERVER_NAME};
pub use insights::{InsightsToolProvider, INSIGHTS_SERVER_NAME};

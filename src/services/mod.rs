//! Application services: the chat relay, tools, insights and the agent gateway.

pub mod builtin_tools;
pub mod gateway;
pub mod insights;
pub mod relay;
pub mod tool_extraction;
pub mod tool_registry;

pub use builtin_tools::default_registry;
pub use gateway::{GatewayResponse, InsightsGateway};
pub use insights::InsightsService;
pub use relay::{RelayEnd, StreamingRelay};
pub use tool_extraction::extract_tool_invocation;
pub use tool_registry::ToolRegistry;

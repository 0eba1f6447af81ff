//! Domain models

pub mod config;
pub mod credentials;
pub mod insights;
pub mod outcome;
pub mod session;
pub mod tool_call;

pub use config::{
    ApiConfig, AuthConfig, AuthType, CacheConfig, ClaudeConfig, Config, InsightsConfig,
    LoggingConfig, RateLimitConfig, ServerConfig, ToolsConfig,
};
pub use credentials::Credentials;
pub use insights::{DesktopMetric, MetricReport};
pub use outcome::{FailureOutcome, Outcome, SuccessOutcome};
pub use session::SessionHandle;
pub use tool_call::ToolInvocation;

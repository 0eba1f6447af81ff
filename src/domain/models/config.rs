//! Typed configuration, one struct per config section.

use serde::{Deserialize, Serialize};

/// Main configuration structure for apirelay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Upstream API the authenticated client talks to
    #[serde(default)]
    pub api: ApiConfig,

    /// Credentials for the upstream API
    #[serde(default)]
    pub auth: AuthConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Response cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Docker Desktop insights API configuration
    #[serde(default)]
    pub insights: InsightsConfig,

    /// Anthropic Messages API configuration
    #[serde(default)]
    pub claude: ClaudeConfig,

    /// Built-in chat tools configuration
    #[serde(default)]
    pub tools: ToolsConfig,

    /// HTTP server and agent gateway configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiConfig {
    /// Base URL every endpoint is resolved against
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header sent upstream
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base_url() -> String {
    "https://api.example.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("apirelay/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Which credential scheme the API client uses
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    /// `Authorization: Bearer <token>`
    #[default]
    Bearer,
    /// `X-API-Key: <key>`
    #[serde(alias = "api_key")]
    ApiKey,
    /// OAuth2 client-credentials grant
    #[serde(alias = "oauth")]
    OAuth2,
}

/// Raw credential settings as loaded from config and environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthConfig {
    /// Credential scheme
    #[serde(default, rename = "type")]
    pub auth_type: AuthType,

    /// Bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OAuth2 client id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// OAuth2 token endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    /// Pre-issued OAuth2 access token, used until the first refresh
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Fixed-window rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Requests allowed per window and key
    #[serde(default = "default_points")]
    pub points: u32,

    /// Window length in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,

    /// How long a key stays blocked after exhausting its budget, in seconds
    #[serde(default = "default_block_duration_secs")]
    pub block_duration_secs: u64,
}

const fn default_points() -> u32 {
    100
}

const fn default_duration_secs() -> u64 {
    60
}

const fn default_block_duration_secs() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
            duration_secs: default_duration_secs(),
            block_duration_secs: default_block_duration_secs(),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Interval between expired-entry sweeps in seconds (0 disables the sweeper)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

const fn default_ttl_secs() -> u64 {
    300
}

const fn default_sweep_interval_secs() -> u64 {
    120
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Docker Desktop insights API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InsightsConfig {
    /// Insights API host
    #[serde(default = "default_insights_base_url")]
    pub base_url: String,

    /// Bearer token for the insights API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Organization whose metrics are queried
    #[serde(default = "default_insights_org")]
    pub org: String,
}

fn default_insights_base_url() -> String {
    "https://api.docker.com".to_string()
}

fn default_insights_org() -> String {
    "docker".to_string()
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            base_url: default_insights_base_url(),
            token: None,
            org: default_insights_org(),
        }
    }
}

/// Anthropic Messages API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClaudeConfig {
    /// API key (usually from `ANTHROPIC_API_KEY`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the API (for testing/proxies)
    #[serde(default = "default_claude_base_url")]
    pub base_url: String,

    /// Model used for chat streaming
    #[serde(default = "default_claude_model")]
    pub model: String,

    /// Maximum tokens per streamed reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_claude_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_claude_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_claude_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

const fn default_max_tokens() -> u32 {
    512
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_claude_timeout_secs() -> u64 {
    300
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_claude_base_url(),
            model: default_claude_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_claude_timeout_secs(),
        }
    }
}

/// Upstreams used by the built-in chat tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolsConfig {
    /// Weather service base URL
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,

    /// Search service base URL
    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,
}

fn default_weather_base_url() -> String {
    "https://wttr.in".to_string()
}

fn default_search_base_url() -> String {
    "https://api.duckduckgo.com".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather_base_url: default_weather_base_url(),
            search_base_url: default_search_base_url(),
        }
    }
}

/// HTTP server and agent gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Service name reported by `/health`
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Local agent API base URL
    #[serde(default = "default_agent_base_url")]
    pub agent_base_url: String,

    /// Agent the gateway talks to
    #[serde(default = "default_agent_name")]
    pub agent_name: String,

    /// How long an agent session is reused, in seconds
    #[serde(default = "default_session_reuse_secs")]
    pub session_reuse_secs: u64,

    /// Agent request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub agent_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    3001
}

fn default_service_name() -> String {
    "docker-insights-api-server".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8080".to_string(),
    ]
}

fn default_agent_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_agent_name() -> String {
    "root".to_string()
}

const fn default_session_reuse_secs() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            service_name: default_service_name(),
            allowed_origins: default_allowed_origins(),
            agent_base_url: default_agent_base_url(),
            agent_name: default_agent_name(),
            session_reuse_secs: default_session_reuse_secs(),
            agent_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout/stderr only when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

//! Authenticated API MCP tools
//!
//! Exposes the [`ApiClient`] as `api_call`, `validate_auth`,
//! `rate_limit_status` and `clear_cache`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::domain::errors::ToolError;
use crate::domain::models::Outcome;
use crate::infrastructure::http::{ApiClient, ClearResult};
use crate::infrastructure::mcp::server::ToolProvider;
use crate::infrastructure::mcp::types::{
    ApiCallArgs, ClearCacheArgs, RateLimitStatusArgs, ServerInfo, ToolDefinition,
};

/// Name reported by the API server
pub const API_SERVER_NAME: &str = "authenticated-api-server";

pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::validation(tool, format!("Invalid parameters: {e}")))
}

pub(crate) fn pretty<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value).map_err(|e| ToolError::execution(e.to_string()))
}

/// Tools backed by one authenticated API client
#[derive(Debug, Clone)]
pub struct ApiToolProvider {
    client: Arc<ApiClient>,
}

impl ApiToolProvider {
    /// Tools over `client`
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    async fn api_call(&self, arguments: Value) -> Result<String, ToolError> {
        let args: ApiCallArgs = parse_args("api_call", arguments)?;
        let outcome = self
            .client
            .request(&args.method, &args.endpoint, args.data.as_ref(), args.use_cache)
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?;
        pretty(&outcome)
    }

    async fn validate_auth(&self) -> Result<String, ToolError> {
        let outcome = self
            .client
            .request("GET", "/health", None, false)
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?;

        Ok(match outcome {
            Outcome::Success(ok) if ok.status == 200 => "Authentication is valid".to_string(),
            Outcome::Success(ok) => format!("Authentication failed: unexpected status {}", ok.status),
            Outcome::Failure(failed) => format!("Authentication failed: {}", failed.message),
        })
    }

    fn rate_limit_status(&self, arguments: Value) -> Result<String, ToolError> {
        let args: RateLimitStatusArgs = parse_args("rate_limit_status", arguments)?;
        let endpoint = args.endpoint.as_deref().unwrap_or("/");
        pretty(&self.client.rate_limit_status(endpoint))
    }

    fn clear_cache(&self, arguments: Value) -> Result<String, ToolError> {
        let args: ClearCacheArgs = parse_args("clear_cache", arguments)?;
        let pattern = args.pattern.as_deref().filter(|p| !p.is_empty());

        Ok(match self.client.clear_cache(pattern) {
            ClearResult::Removed(count) => format!(
                "Cleared {count} cache entries matching \"{}\"",
                pattern.unwrap_or_default()
            ),
            ClearResult::All => "All cache entries cleared".to_string(),
        })
    }
}

#[async_trait]
impl ToolProvider for ApiToolProvider {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: API_SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "api_call",
                "Make authenticated API calls to external services",
                json!({
                    "type": "object",
                    "properties": {
                        "method": {
                            "type": "string",
                            "enum": ["GET", "POST", "PUT", "DELETE", "PATCH"],
                            "description": "HTTP method"
                        },
                        "endpoint": {
                            "type": "string",
                            "description": "API endpoint (e.g., /users, /orders/123)"
                        },
                        "data": {
                            "type": "object",
                            "description": "Request payload; query parameters for GET"
                        },
                        "useCache": {
                            "type": "boolean",
                            "description": "Serve GET responses from cache when fresh",
                            "default": true
                        }
                    },
                    "required": ["method", "endpoint"]
                }),
            ),
            ToolDefinition::new(
                "validate_auth",
                "Validate current authentication status",
                json!({ "type": "object", "properties": {} }),
            ),
            ToolDefinition::new(
                "rate_limit_status",
                "Show the remaining rate limit budget for an endpoint",
                json!({
                    "type": "object",
                    "properties": {
                        "endpoint": {
                            "type": "string",
                            "description": "API endpoint (default: /)"
                        }
                    }
                }),
            ),
            ToolDefinition::new(
                "clear_cache",
                "Clear cached API responses",
                json!({
                    "type": "object",
                    "properties": {
                        "pattern": {
                            "type": "string",
                            "description": "Only clear entries whose key contains this text"
                        }
                    }
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        info!(tool = name, "api tool called");
        match name {
            "api_call" => self.api_call(arguments).await,
            "validate_auth" => self.validate_auth().await,
            "rate_limit_status" => self.rate_limit_status(arguments),
            "clear_cache" => self.clear_cache(arguments),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

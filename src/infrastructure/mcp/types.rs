//! MCP wire types
//!
//! JSON-RPC 2.0 envelopes plus the MCP `tools/*` payloads

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC version accepted and emitted
pub const JSONRPC_VERSION: &str = "2.0";
/// MCP protocol version reported by `initialize`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Body was not valid JSON
pub const PARSE_ERROR: i32 = -32700;
/// Not a valid JSON-RPC request
pub const INVALID_REQUEST: i32 = -32600;
/// Unsupported method
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Malformed method parameters
pub const INVALID_PARAMS: i32 = -32602;

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `2.0`
    pub jsonrpc: String,
    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Request with an id
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// Requests without an id, and anything under `notifications/`, get no reply
    pub fn is_notification(&self) -> bool {
        self.id.is_none() || self.method.starts_with("notifications/")
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always `2.0`
    pub jsonrpc: String,
    /// Id of the request answered, `null` for parse errors
    pub id: Option<Value>,
    /// Set on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Set on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Successful response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// JSON-RPC error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Extra error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl IntoResponse for JsonRpcResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Name and version reported by `initialize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

/// One entry of the `tools/list` result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// JSON Schema of the arguments
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Definition from borrowed parts
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// `tools/call` parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    /// Tool to call
    pub name: String,
    /// Tool arguments, `{}` when absent
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// `tools/call` result: a single text block, flagged when the call failed
pub fn text_result(text: impl Into<String>, is_error: bool) -> Value {
    let mut result = json!({
        "content": [
            {
                "type": "text",
                "text": text.into()
            }
        ]
    });
    if is_error {
        result["isError"] = Value::Bool(true);
    }
    result
}

// ============================================================================
// API server arguments
// ============================================================================

/// `api_call` arguments
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallArgs {
    /// HTTP method
    pub method: String,
    /// Path relative to the API base URL
    pub endpoint: String,
    /// Query parameters for GET, JSON body otherwise
    #[serde(default)]
    pub data: Option<Value>,
    /// Serve GETs from the cache when possible
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

const fn default_use_cache() -> bool {
    true
}

/// `rate_limit_status` arguments
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitStatusArgs {
    /// Endpoint whose budget to report, `/` by default
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// `clear_cache` arguments
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheArgs {
    /// Substring of cache keys to remove; everything when absent
    #[serde(default)]
    pub pattern: Option<String>,
}

// ============================================================================
// Insights server arguments
// ============================================================================

/// `get_desktop_metric` arguments
#[derive(Debug, Clone, Deserialize)]
pub struct DesktopMetricArgs {
    /// Metric name
    pub metric: String,
    /// Timespan, `3m` by default
    #[serde(default)]
    pub timespan: Option<String>,
}

/// `get_all_desktop_metrics` arguments
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllMetricsArgs {
    /// Timespan, `3m` by default
    #[serde(default)]
    pub timespan: Option<String>,
}

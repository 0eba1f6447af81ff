//! Minimal MCP tool server
//!
//! Serves `initialize`, `ping`, `tools/list` and `tools/call` for any
//! [`ToolProvider`], over newline-delimited stdio or HTTP `POST /`.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use super::error::McpError;
use super::types::{
    text_result, JsonRpcRequest, JsonRpcResponse, ServerInfo, ToolCallParams, ToolDefinition,
    JSONRPC_VERSION, PROTOCOL_VERSION,
};
use crate::domain::errors::ToolError;

/// A set of tools exposed by one MCP server
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Name and version for `initialize`
    fn server_info(&self) -> ServerInfo;

    /// Tools advertised by `tools/list`
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Run `name`; errors are reported to the client with `isError`
    async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError>;
}

/// JSON-RPC dispatcher around a [`ToolProvider`]
#[derive(Clone)]
pub struct McpServer {
    provider: Arc<dyn ToolProvider>,
}

impl McpServer {
    /// Server for `provider`
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self { provider }
    }

    /// Handle one request. Notifications produce no response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, "received request");

        if request.is_notification() {
            debug!(method = %request.method, "notification acknowledged");
            return None;
        }

        let id = request.id.clone();
        let result = match request.method.as_str() {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.provider.tools() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(err) => JsonRpcResponse::error(id, err.code(), err.to_string()),
        })
    }

    /// Handle one line of newline-delimited JSON-RPC
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) if request.jsonrpc == JSONRPC_VERSION => self.handle(request).await,
            Ok(request) => {
                let err = McpError::InvalidRequest(format!(
                    "unsupported jsonrpc version {}",
                    request.jsonrpc
                ));
                Some(JsonRpcResponse::error(request.id, err.code(), err.to_string()))
            }
            Err(err) => {
                let err = McpError::from(err);
                Some(JsonRpcResponse::error(None, err.code(), err.to_string()))
            }
        }
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": self.provider.server_info()
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, McpError> {
        let params = params.ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;
        let params: ToolCallParams =
            serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))?;

        info!(tool = %params.name, "tool called");
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        Ok(match self.provider.call(&params.name, arguments).await {
            Ok(text) => text_result(text, false),
            Err(err) => {
                warn!(tool = %params.name, error = %err, "tool call failed");
                text_result(format!("Error: {err}"), true)
            }
        })
    }

    /// Serve newline-delimited JSON-RPC until `reader` is exhausted
    pub async fn serve_io<R, W>(&self, reader: R, mut writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut payload = serde_json::to_vec(&response)?;
                payload.push(b'\n');
                writer.write_all(&payload).await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Serve over the process's stdin/stdout
    pub async fn serve_stdio(&self) -> Result<()> {
        let info = self.provider.server_info();
        info!(server = %info.name, "MCP server running on stdio");

        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve_io(stdin, tokio::io::stdout())
            .await
            .context("stdio transport failed")
    }

    /// Router accepting JSON-RPC on `POST /`
    pub fn router(self) -> Router {
        Router::new()
            .route("/", post(handle_http))
            .with_state(Arc::new(self))
    }

    /// Serve the router on `host:port`
    pub async fn serve_http(self, host: &str, port: u16) -> Result<()> {
        let info = self.provider.server_info();
        let addr = format!("{host}:{port}");
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        info!(server = %info.name, %addr, "HTTP MCP server listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn handle_http(
    State(server): State<Arc<McpServer>>,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    match server.handle(request).await {
        Some(response) => response.into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

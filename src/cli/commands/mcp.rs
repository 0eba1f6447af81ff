//! MCP server command handlers
//!
//! Build the API client for each server and run it over the chosen transport.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tracing::warn;

use crate::domain::models::Config;
use crate::infrastructure::http::{ApiClient, ApiClientConfig};
use crate::infrastructure::mcp::{ApiToolProvider, InsightsToolProvider, McpServer};
use crate::services::InsightsService;

/// How an MCP server is exposed
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout
    #[default]
    Stdio,
    /// JSON-RPC on HTTP `POST /`
    Http,
}

/// Arguments shared by `mcp-api` and `mcp-insights`
#[derive(Args, Debug)]
pub struct McpArgs {
    /// Transport to serve on
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Port for the HTTP transport (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,
}

fn build_client(client_config: ApiClientConfig, config: &Config) -> Result<Arc<ApiClient>> {
    let client = Arc::new(ApiClient::new(client_config).context("Failed to create API client")?);
    if config.cache.sweep_interval_secs > 0 {
        client.spawn_maintenance(Duration::from_secs(config.cache.sweep_interval_secs));
    }
    Ok(client)
}

async fn run(server: McpServer, args: &McpArgs, config: &Config) -> Result<()> {
    match args.transport {
        Transport::Stdio => server.serve_stdio().await,
        Transport::Http => {
            let port = args.port.unwrap_or(config.server.port);
            server.serve_http(&config.server.host, port).await
        }
    }
}

/// Handle `apirelay mcp-api`
pub async fn execute_api(args: McpArgs, config: Config) -> Result<()> {
    let client = build_client(ApiClientConfig::from_config(&config), &config)?;
    let server = McpServer::new(Arc::new(ApiToolProvider::new(client)));
    run(server, &args, &config).await
}

/// Handle `apirelay mcp-insights`
pub async fn execute_insights(args: McpArgs, config: Config) -> Result<()> {
    if config.insights.token.is_none() && config.auth.token.is_none() {
        warn!("no insights token configured; requests will fail authentication");
    }

    let client = build_client(ApiClientConfig::for_insights(&config), &config)?;
    let service = InsightsService::new(client, config.insights.org.clone());
    let server = McpServer::new(Arc::new(InsightsToolProvider::new(service)));
    run(server, &args, &config).await
}

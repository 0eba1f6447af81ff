//! Implementation of the `apirelay serve` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use crate::domain::models::Config;
use crate::infrastructure::agent::{AgentClient, AgentClientConfig};
use crate::infrastructure::claude::ClaudeClient;
use crate::infrastructure::web::{build_router, serve, AppState};
use crate::services::{default_registry, InsightsGateway, StreamingRelay};

/// Arguments for `apirelay serve`
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,
}

/// Handle `apirelay serve`
pub async fn execute(args: ServeArgs, config: Config) -> Result<()> {
    let registry = Arc::new(default_registry(&config.tools).context("Failed to build tool registry")?);

    let relay = match ClaudeClient::new(&config.claude) {
        Ok(client) => Some(Arc::new(StreamingRelay::new(Arc::new(client), registry))),
        Err(err) => {
            warn!(error = %err, "chat streaming disabled");
            None
        }
    };

    let agent = AgentClient::new(AgentClientConfig::from_config(&config.server))
        .context("Failed to create agent client")?;
    info!(agent_base_url = %agent.base_url(), agent = %config.server.agent_name, "agent gateway configured");

    let state = AppState {
        relay,
        gateway: Arc::new(InsightsGateway::new(Arc::new(agent))),
        service_name: config.server.service_name.clone(),
    };
    let router = build_router(state, &config.server.allowed_origins)?;

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    serve(router, &host, port).await
}

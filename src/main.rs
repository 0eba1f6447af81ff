//! apirelay CLI entry point.

use anyhow::Result;
use clap::Parser;

use apirelay::cli::{commands, handle_error, load_config, Cli, Commands};
use apirelay::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        handle_error(err);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let _logger = LoggerImpl::init(&LogConfig::from_settings(
        &config.logging,
        cli.command.log_writer(),
    ))?;

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::McpApi(args) => commands::mcp::execute_api(args, config).await,
        Commands::McpInsights(args) => commands::mcp::execute_insights(args, config).await,
        Commands::Chat(args) => commands::chat::execute(args, config).await,
    }
}

//! Implementation of the `apirelay chat` command.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::domain::models::Config;
use crate::infrastructure::claude::ClaudeClient;
use crate::services::{default_registry, StreamingRelay};

/// Arguments for `apirelay chat`
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Prompt to send
    pub prompt: String,
}

/// Handle `apirelay chat`
pub async fn execute(args: ChatArgs, config: Config) -> Result<()> {
    let registry = Arc::new(default_registry(&config.tools)?);
    let client = ClaudeClient::new(&config.claude).context("Failed to create Claude client")?;
    let relay = StreamingRelay::new(Arc::new(client), registry);

    let stream = relay
        .open(&args.prompt)
        .await
        .context("Failed to open model stream")?;

    let (tx, mut rx) = mpsc::channel(64);
    let pump = tokio::spawn(async move { relay.pump(stream, tx).await });

    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = rx.recv().await {
        stdout.write_all(chunk.as_bytes()).await?;
        stdout.flush().await?;
    }
    stdout.write_all(b"\n").await?;

    pump.await.context("Relay task failed")?;
    Ok(())
}

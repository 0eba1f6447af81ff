//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::chat::ChatArgs;
use super::commands::mcp::{McpArgs, Transport};
use super::commands::serve::ServeArgs;
use crate::infrastructure::logging::LogWriter;

/// Top-level command line
#[derive(Parser, Debug)]
#[command(name = "apirelay")]
#[command(about = "Authenticated API relay, MCP tool servers and streaming chat", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to .apirelay/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// apirelay subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (chat streaming, agent gateway, health)
    Serve(ServeArgs),

    /// Run the authenticated API MCP server
    McpApi(McpArgs),

    /// Run the Docker Desktop insights MCP server
    McpInsights(McpArgs),

    /// Stream a single chat reply to stdout
    Chat(ChatArgs),
}

impl Commands {
    /// Where logs go: stdout is reserved for JSON-RPC and chat output
    pub fn log_writer(&self) -> LogWriter {
        match self {
            Self::Serve(_) => LogWriter::Stdout,
            Self::McpApi(args) | Self::McpInsights(args) if args.transport == Transport::Http => {
                LogWriter::Stdout
            }
            Self::McpApi(_) | Self::McpInsights(_) | Self::Chat(_) => LogWriter::Stderr,
        }
    }
}

//! Streaming chat relay.
//!
//! Model tokens are forwarded to a sink as they arrive and accumulated. Once
//! the stream is exhausted the accumulated text is searched for one embedded
//! tool call, which is dispatched through the [`ToolRegistry`]; its outcome is
//! appended to the sink as a trailing notice.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::domain::errors::ToolError;
use crate::domain::ports::{TokenStream, TokenStreamer};
use crate::services::tool_extraction::extract_tool_invocation;
use crate::services::tool_registry::ToolRegistry;

/// How a relay run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEnd {
    /// Stream finished and no tool call was present
    Completed,
    /// Stream finished and a tool call was dispatched; `notice` was appended
    ToolDispatched {
        /// Tool named in the model output
        tool: String,
        /// Text appended to the sink
        notice: String,
    },
    /// The model stream failed part way through
    Interrupted,
    /// The sink was dropped before the stream finished
    Disconnected,
}

/// Relay between a model backend and a token sink
#[derive(Clone)]
pub struct StreamingRelay {
    streamer: Arc<dyn TokenStreamer>,
    registry: Arc<ToolRegistry>,
}

impl std::fmt::Debug for StreamingRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingRelay")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl StreamingRelay {
    /// Relay from `streamer` dispatching through `registry`
    pub fn new(streamer: Arc<dyn TokenStreamer>, registry: Arc<ToolRegistry>) -> Self {
        Self { streamer, registry }
    }

    /// Tools available to the model
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Start the model stream. Failures surface here, before any output.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn open(&self, prompt: &str) -> anyhow::Result<TokenStream> {
        let system = self.registry.system_prompt();
        self.streamer.stream_text(&system, prompt).await
    }

    /// Forward `stream` into `sink`, then resolve at most one tool call.
    ///
    /// The sink is dropped on return, which closes the receiving side.
    pub async fn pump(&self, mut stream: TokenStream, sink: mpsc::Sender<String>) -> RelayEnd {
        let mut transcript = String::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(token) => {
                    transcript.push_str(&token);
                    if sink.send(token).await.is_err() {
                        debug!("relay sink closed, abandoning stream");
                        return RelayEnd::Disconnected;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "model stream interrupted");
                    let _ = sink
                        .send(format!("\n\n⚠️ Stream interrupted: {err}"))
                        .await;
                    return RelayEnd::Interrupted;
                }
            }
        }

        let Some(invocation) = extract_tool_invocation(&transcript) else {
            return RelayEnd::Completed;
        };

        info!(tool = %invocation.tool, "tool call found in model output");
        let notice = match self.registry.dispatch(&invocation).await {
            Ok(output) => format!("\n\n(Tool Output from \"{}\"):\n{output}", invocation.tool),
            Err(ToolError::NotFound(name)) => format!("\n\n⚠️ Unknown tool \"{name}\"."),
            Err(ToolError::Validation { tool, reason }) => {
                debug!(%tool, %reason, "tool parameters rejected");
                format!("\n\n⚠️ Invalid parameters for tool \"{tool}\".")
            }
            Err(err @ ToolError::Execution(_)) => {
                warn!(tool = %invocation.tool, error = %err, "tool execution failed");
                format!("\n\n⚠️ Error running tool \"{}\": {err}", invocation.tool)
            }
        };

        let _ = sink.send(notice.clone()).await;
        RelayEnd::ToolDispatched {
            tool: invocation.tool,
            notice,
        }
    }

    /// Open and pump in one call
    pub async fn relay(&self, prompt: &str, sink: mpsc::Sender<String>) -> anyhow::Result<RelayEnd> {
        let stream = self.open(prompt).await?;
        Ok(self.pump(stream, sink).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::builtin_tools::EchoTool;
    use async_trait::async_trait;

    struct Scripted(Vec<Result<&'static str, &'static str>>);

    #[async_trait]
    impl TokenStreamer for Scripted {
        async fn stream_text(&self, _system: &str, _prompt: &str) -> anyhow::Result<TokenStream> {
            let items: Vec<anyhow::Result<String>> = self
                .0
                .iter()
                .map(|item| match item {
                    Ok(token) => Ok((*token).to_string()),
                    Err(message) => Err(anyhow::anyhow!(*message)),
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    fn relay(script: Vec<Result<&'static str, &'static str>>) -> StreamingRelay {
        let registry = ToolRegistry::new().with_tool(Arc::new(EchoTool)).unwrap();
        StreamingRelay::new(Arc::new(Scripted(script)), Arc::new(registry))
    }

    async fn run(relay: &StreamingRelay) -> (String, RelayEnd) {
        let (tx, mut rx) = mpsc::channel(16);
        let end = relay.relay("prompt", tx).await.unwrap();
        let mut out = String::new();
        while let Some(chunk) = rx.recv().await {
            out.push_str(&chunk);
        }
        (out, end)
    }

    #[tokio::test]
    async fn test_tool_call_split_across_tokens() {
        let relay = relay(vec![
            Ok(r#"{"tool": "ec"#),
            Ok(r#"ho", "parameters": {"text": "hi"}}"#),
        ]);

        let (out, end) = run(&relay).await;
        assert!(out.ends_with("\n\n(Tool Output from \"echo\"):\nhi"));
        assert!(matches!(end, RelayEnd::ToolDispatched { tool, .. } if tool == "echo"));
    }

    #[tokio::test]
    async fn test_interrupted_stream_skips_dispatch() {
        let relay = relay(vec![
            Ok(r#"{"tool": "echo", "parameters": {"text": "hi"}}"#),
            Err("connection reset"),
        ]);

        let (out, end) = run(&relay).await;
        assert!(out.ends_with("\n\n⚠️ Stream interrupted: connection reset"));
        assert!(!out.contains("Tool Output"));
        assert_eq!(end, RelayEnd::Interrupted);
    }

    #[tokio::test]
    async fn test_closed_sink_stops_relay() {
        let relay = relay(vec![Ok("a"), Ok("b")]);
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let end = relay.relay("prompt", tx).await.unwrap();
        assert_eq!(end, RelayEnd::Disconnected);
    }
}

//! Port for streaming model text.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

/// Stream of reply text fragments in arrival order
pub type TokenStream = Pin<Box<dyn Stream<Item = anyhow::Result<String>> + Send>>;

/// Model backend that streams reply text for a system instruction and a prompt
#[async_trait]
pub trait TokenStreamer: Send + Sync {
    /// Open the stream. Errors here happen before any token is produced.
    async fn stream_text(&self, system: &str, prompt: &str) -> anyhow::Result<TokenStream>;
}

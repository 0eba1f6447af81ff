//! Anthropic Messages API streaming client

pub mod client;
pub mod errors;
pub mod streaming;
pub mod types;

pub use client::ClaudeClient;
pub use errors::ClaudeApiError;
pub use streaming::{text_deltas, Delta, SseStreamParser, StreamEvent};
pub use types::{Message, MessageRequest};

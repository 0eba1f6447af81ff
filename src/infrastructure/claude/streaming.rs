//! Typed Messages API stream events.
//!
//! The API returns Server-Sent Events with the following event types:
//! - message_start: Initial message metadata
//! - content_block_start / content_block_delta / content_block_stop
//! - message_delta: Message-level updates (e.g., stop_reason)
//! - message_stop: End of message
//! - ping, error

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::errors::ClaudeApiError;
use super::types::Usage;
use crate::infrastructure::sse::SseDataStream;

/// Streaming event from the Messages API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Message start event
    #[serde(rename = "message_start")]
    MessageStart {
        /// Message metadata
        message: MessageStartData,
    },

    /// Content block start
    #[serde(rename = "content_block_start")]
    ContentBlockStart {
        /// Content block index
        index: usize,
        /// Initial block contents
        content_block: Value,
    },

    /// Content block delta (incremental update)
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta {
        /// Content block index
        index: usize,
        /// Incremental content
        delta: Delta,
    },

    /// Content block stop
    #[serde(rename = "content_block_stop")]
    ContentBlockStop {
        /// Content block index
        index: usize,
    },

    /// Message delta (stop reason and usage updates)
    #[serde(rename = "message_delta")]
    MessageDelta {
        /// Message-level changes
        delta: MessageDeltaData,
    },

    /// Message stop event
    #[serde(rename = "message_stop")]
    MessageStop,

    /// Ping event (keepalive)
    #[serde(rename = "ping")]
    Ping,

    /// Error event
    #[serde(rename = "error")]
    Error {
        /// Error details
        error: ErrorData,
    },
}

/// Message start data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStartData {
    /// Message id
    pub id: String,
    /// Model serving the reply
    #[serde(default)]
    pub model: String,
    /// Token usage so far
    #[serde(default)]
    pub usage: Usage,
}

/// Content delta for streaming updates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Delta {
    /// Text delta
    #[serde(rename = "text_delta")]
    TextDelta {
        /// Text fragment
        text: String,
    },

    /// Input JSON delta
    #[serde(rename = "input_json_delta")]
    InputJsonDelta {
        /// Fragment of tool input JSON
        partial_json: String,
    },
}

/// Message delta data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeltaData {
    /// Why generation stopped
    pub stop_reason: Option<String>,
    /// Stop sequence that matched, if any
    #[serde(default)]
    pub stop_sequence: Option<String>,
}

/// Error data from stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    /// Error category
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message
    pub message: String,
}

/// Parses a Messages API response body into `StreamEvent`s
pub struct SseStreamParser {
    frames: SseDataStream,
}

impl SseStreamParser {
    /// Create a new SSE parser from a byte stream
    pub fn new(stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static) -> Self {
        Self {
            frames: SseDataStream::new(stream),
        }
    }
}

impl Stream for SseStreamParser {
    type Item = Result<StreamEvent, ClaudeApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let data = match self.frames.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(data))) => data,
                Poll::Ready(Some(Err(err))) => {
                    return Poll::Ready(Some(Err(ClaudeApiError::NetworkError(err))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            };

            if data == "[DONE]" {
                continue;
            }

            return Poll::Ready(Some(match serde_json::from_str::<StreamEvent>(&data) {
                Ok(event) => {
                    debug!("Parsed SSE event: {:?}", event);
                    Ok(event)
                }
                Err(err) => {
                    warn!("Failed to parse SSE event: {} - Data: {}", err, data);
                    Err(ClaudeApiError::JsonError(err))
                }
            }));
        }
    }
}

/// Reduce an event stream to its text deltas.
///
/// `error` events become stream errors; every other event is skipped.
pub fn text_deltas(
    events: impl Stream<Item = Result<StreamEvent, ClaudeApiError>> + Send + 'static,
) -> impl Stream<Item = Result<String, ClaudeApiError>> + Send + 'static {
    events.filter_map(|event| async move {
        match event {
            Ok(StreamEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
                ..
            }) => Some(Ok(text)),
            Ok(StreamEvent::Error { error }) => Some(Err(ClaudeApiError::StreamError {
                error_type: error.error_type,
                message: error.message,
            })),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        }
    })
}

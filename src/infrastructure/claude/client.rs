//! Anthropic Messages API client (streaming only).

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{header, Client as ReqwestClient};
use tracing::{debug, info, instrument, warn};

use super::errors::ClaudeApiError;
use super::streaming::{text_deltas, SseStreamParser};
use super::types::{Message, MessageRequest};
use crate::domain::models::ClaudeConfig;
use crate::domain::ports::{TokenStream, TokenStreamer};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// HTTP client for the streaming Messages API
pub struct ClaudeClient {
    http_client: ReqwestClient,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl ClaudeClient {
    /// Create a new client from configuration.
    ///
    /// Fails with `MissingApiKey` when no key is configured.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeApiError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClaudeApiError::MissingApiKey)?;

        let mut headers = header::HeaderMap::new();
        let mut key_value = header::HeaderValue::from_str(api_key)
            .map_err(|e| ClaudeApiError::InvalidRequest(format!("Invalid API key: {e}")))?;
        key_value.set_sensitive(true);
        headers.insert("x-api-key", key_value);
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()?;

        info!(
            base_url = %config.base_url,
            model = %config.model,
            "Initializing Claude API client"
        );

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Build the streaming request for one user prompt
    pub fn build_request(&self, system: &str, prompt: &str) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            system: (!system.is_empty()).then(|| system.to_string()),
            temperature: Some(self.temperature),
            stream: Some(true),
        }
    }

    /// Open a streaming request and return its parsed events
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    pub async fn stream_message(
        &self,
        request: &MessageRequest,
    ) -> Result<SseStreamParser, ClaudeApiError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!("POST {}", url);

        let response = self.http_client.post(&url).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            warn!("API error ({}): {}", status, body);
            return Err(ClaudeApiError::from_status(status, body));
        }

        Ok(SseStreamParser::new(response.bytes_stream()))
    }

    /// Stream the reply text for `prompt` under the `system` instruction
    pub async fn stream_text(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<impl Stream<Item = Result<String, ClaudeApiError>> + Send + 'static, ClaudeApiError>
    {
        let request = self.build_request(system, prompt);
        let events = self.stream_message(&request).await?;
        Ok(text_deltas(events))
    }
}

#[async_trait]
impl TokenStreamer for ClaudeClient {
    async fn stream_text(&self, system: &str, prompt: &str) -> anyhow::Result<TokenStream> {
        let tokens = Self::stream_text(self, system, prompt).await?;
        Ok(tokens.map(|token| token.map_err(anyhow::Error::from)).boxed())
    }
}

//! Client for the local agent API.
//!
//! Sessions are created on demand and reused for a configured window.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use reqwest::Response;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::errors::AgentError;
use crate::domain::models::{ServerConfig, SessionHandle};
use crate::infrastructure::sse::SseDataStream;

/// Agent endpoint settings
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    /// Agent API base URL, without a trailing slash
    pub base_url: String,
    /// Agent addressed by `ask`
    pub agent_name: String,
    /// How long a session is reused
    pub session_reuse: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AgentClientConfig {
    /// Settings from the `server` config section
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            base_url: config.agent_base_url.trim_end_matches('/').to_string(),
            agent_name: config.agent_name.clone(),
            session_reuse: Duration::from_secs(config.session_reuse_secs),
            timeout: Duration::from_secs(config.agent_timeout_secs),
        }
    }
}

/// Talks to one named agent, reusing its session within the reuse window
#[derive(Debug)]
pub struct AgentClient {
    http: reqwest::Client,
    config: AgentClientConfig,
    session: Mutex<Option<SessionHandle>>,
}

impl AgentClient {
    /// Create a client; no session is opened until first use
    pub fn new(config: AgentClientConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            session: Mutex::new(None),
        })
    }

    /// Agent API base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Current session id, creating a session when none is reusable
    pub async fn session_id(&self) -> Result<String, AgentError> {
        {
            let guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(handle) = guard.as_ref().filter(|h| h.is_reusable(self.config.session_reuse)) {
                debug!(session_id = %handle.session_id, "reusing agent session");
                return Ok(handle.session_id.clone());
            }
        }

        let handle = self.create_session().await?;
        let session_id = handle.session_id.clone();
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(session_id)
    }

    async fn create_session(&self) -> Result<SessionHandle, AgentError> {
        let url = format!("{}/api/sessions", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| AgentError::from_send(e, &self.config.base_url))?;
        let body: Value = check_status(response).await?.json().await?;

        let session_id = ["id", "session_id", "sessionId"]
            .iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .ok_or(AgentError::MissingSessionId)?;

        info!(%session_id, "created agent session");
        Ok(SessionHandle::new(session_id))
    }

    /// Send `prompt` to the agent and collect the streamed reply
    #[instrument(skip(self, prompt), fields(agent = %self.config.agent_name))]
    pub async fn ask(&self, prompt: &str) -> Result<String, AgentError> {
        let session_id = self.session_id().await?;
        let url = format!(
            "{}/api/sessions/{session_id}/agent/{}",
            self.config.base_url, self.config.agent_name
        );

        let response = self
            .http
            .post(&url)
            .json(&json!([{ "role": "user", "content": prompt }]))
            .send()
            .await
            .map_err(|e| AgentError::from_send(e, &self.config.base_url))?;
        let response = check_status(response).await?;

        let mut reply = String::new();
        let mut frames = SseDataStream::new(response.bytes_stream());
        while let Some(data) = frames.next().await {
            if let Some(content) = delta_content(&data?) {
                reply.push_str(&content);
            }
        }

        debug!(reply_len = reply.len(), "agent reply complete");
        Ok(reply)
    }
}

async fn check_status(response: Response) -> Result<Response, AgentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AgentError::Status { status, body })
}

/// Content fragment of one agent SSE payload
fn delta_content(data: &str) -> Option<String> {
    let event: Value = serde_json::from_str(data).ok()?;
    let choice = event
        .get("choice")
        .or_else(|| event.get("choices").and_then(|c| c.get(0)))?;
    choice
        .pointer("/delta/content")
        .and_then(Value::as_str)
        .map(str::to_string)
}

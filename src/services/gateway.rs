//! UI-to-agent gateway behind `POST /api/captain-insights`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::infrastructure::agent::AgentClient;

/// Reply to the UI for one gateway request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    /// The UI payload, echoed back
    pub received: Value,
    /// Agent reply, or the error text on failure
    pub agent_analysis: String,
    /// When the reply was produced
    pub timestamp: DateTime<Utc>,
    /// Whether the agent answered
    pub success: bool,
    /// Short status message
    pub message: String,
}

/// Forwards UI data to the agent and wraps its analysis
#[derive(Debug, Clone)]
pub struct InsightsGateway {
    agent: Arc<AgentClient>,
}

impl InsightsGateway {
    /// Gateway over `agent`
    pub fn new(agent: Arc<AgentClient>) -> Self {
        Self { agent }
    }

    /// Prompt embedding `data` as pretty JSON
    pub fn build_prompt(data: &Value) -> Result<String, serde_json::Error> {
        let pretty = serde_json::to_string_pretty(data)?;
        Ok(format!(
            "I received the following data from the UI: {pretty}. \
             Please analyze this data and provide insights."
        ))
    }

    /// Ask the agent about `data`. Agent failures are reported in the response.
    pub async fn analyze(&self, data: Value) -> Result<GatewayResponse, serde_json::Error> {
        let prompt = Self::build_prompt(&data)?;
        info!(prompt_len = prompt.len(), "forwarding UI data to agent");

        let (agent_analysis, success) = match self.agent.ask(&prompt).await {
            Ok(reply) => (reply, true),
            Err(err) => {
                warn!(error = %err, "agent communication failed");
                (format!("Error communicating with agent: {err}"), false)
            }
        };

        Ok(GatewayResponse {
            received: data,
            agent_analysis,
            timestamp: Utc::now(),
            success,
            message: if success {
                "Request processed by AI agent".to_string()
            } else {
                "AI agent communication failed".to_string()
            },
        })
    }
}

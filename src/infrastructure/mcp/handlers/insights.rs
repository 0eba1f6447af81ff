//! Docker Desktop insights MCP tools

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::api::{parse_args, pretty};
use crate::domain::errors::ToolError;
use crate::domain::models::DesktopMetric;
use crate::infrastructure::mcp::server::ToolProvider;
use crate::infrastructure::mcp::types::{AllMetricsArgs, DesktopMetricArgs, ServerInfo, ToolDefinition};
use crate::services::insights::{InsightsService, DEFAULT_TIMESPAN};

/// Name reported by the insights server
pub const INSIGHTS_SERVER_NAME: &str = "docker-insights-api-server";

/// Docker Desktop metric tools
#[derive(Debug, Clone)]
pub struct InsightsToolProvider {
    service: InsightsService,
}

impl InsightsToolProvider {
    /// Tools over `service`
    pub fn new(service: InsightsService) -> Self {
        Self { service }
    }

    async fn get_desktop_metric(&self, arguments: Value) -> Result<String, ToolError> {
        let args: DesktopMetricArgs = parse_args("get_desktop_metric", arguments)?;
        let metric: DesktopMetric = args
            .metric
            .parse()
            .map_err(|reason: String| ToolError::validation("get_desktop_metric", reason))?;
        let timespan = args.timespan.as_deref().unwrap_or(DEFAULT_TIMESPAN);

        let report = self
            .service
            .get_metric(metric, timespan)
            .await
            .map_err(|e| ToolError::execution(e.to_string()))?;
        pretty(&report)
    }

    async fn get_all_desktop_metrics(&self, arguments: Value) -> Result<String, ToolError> {
        let args: AllMetricsArgs = parse_args("get_all_desktop_metrics", arguments)?;
        let timespan = args.timespan.as_deref().unwrap_or(DEFAULT_TIMESPAN);
        pretty(&self.service.get_all(timespan).await)
    }
}

#[async_trait]
impl ToolProvider for InsightsToolProvider {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: INSIGHTS_SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        let metrics: Vec<&str> = DesktopMetric::ALL.iter().map(|m| m.as_str()).collect();
        vec![
            ToolDefinition::new(
                "get_desktop_metric",
                "Get a specific Docker Desktop metric",
                json!({
                    "type": "object",
                    "properties": {
                        "metric": {
                            "type": "string",
                            "enum": metrics,
                            "description": "The metric to retrieve"
                        },
                        "timespan": {
                            "type": "string",
                            "description": "Time span for the metric (default: 3m)",
                            "default": DEFAULT_TIMESPAN
                        }
                    },
                    "required": ["metric"]
                }),
            ),
            ToolDefinition::new(
                "get_all_desktop_metrics",
                "Get all Docker Desktop metrics for the dashboard",
                json!({
                    "type": "object",
                    "properties": {
                        "timespan": {
                            "type": "string",
                            "description": "Time span for all metrics (default: 3m)",
                            "default": DEFAULT_TIMESPAN
                        }
                    }
                }),
            ),
        ]
    }

    async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        info!(tool = name, "insights tool called");
        match name {
            "get_desktop_metric" => self.get_desktop_metric(arguments).await,
            "get_all_desktop_metrics" => self.get_all_desktop_metrics(arguments).await,
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }
}

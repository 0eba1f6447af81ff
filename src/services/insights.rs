//! Docker Desktop admin insights queries.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{instrument, warn};
use url::form_urlencoded;

use crate::domain::models::{DesktopMetric, MetricReport, Outcome};
use crate::infrastructure::http::{ApiClient, ApiClientError};

/// Timespan used when the caller gives none
pub const DEFAULT_TIMESPAN: &str = "3m";

/// Per-metric entry of [`AllMetricsReport`]
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MetricEntry {
    /// Upstream answered
    Report(MetricReport),
    /// The request never got an answer
    Failed {
        /// Transport or configuration error
        error: String,
        /// When the failure happened
        timestamp: DateTime<Utc>,
        /// Always `false`
        success: bool,
    },
}

/// Every metric for one timespan
#[derive(Debug, Clone, Serialize)]
pub struct AllMetricsReport {
    /// Timespan queried
    pub timespan: String,
    /// When the report was assembled
    pub timestamp: DateTime<Utc>,
    /// One entry per metric
    pub metrics: BTreeMap<DesktopMetric, MetricEntry>,
}

/// Reads metric summaries through a rate-limited, cached [`ApiClient`]
#[derive(Debug, Clone)]
pub struct InsightsService {
    client: Arc<ApiClient>,
    org: String,
}

impl InsightsService {
    /// Service for `org`
    pub fn new(client: Arc<ApiClient>, org: impl Into<String>) -> Self {
        Self {
            client,
            org: org.into(),
        }
    }

    /// Underlying API client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Summary path for `metric`, with `timespan` encoded as the only query parameter
    pub fn endpoint(&self, metric: DesktopMetric, timespan: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("timespan", timespan)
            .finish();
        format!(
            "/v2/admin-insights/orgs/{}/desktop/{metric}/summary?{query}",
            self.org
        )
    }

    /// Summary for one metric. Upstream failures are reported in the result.
    #[instrument(skip(self))]
    pub async fn get_metric(
        &self,
        metric: DesktopMetric,
        timespan: &str,
    ) -> Result<MetricReport, ApiClientError> {
        let endpoint = self.endpoint(metric, timespan);
        let outcome = self.client.request("GET", &endpoint, None, true).await?;

        let report = match outcome {
            Outcome::Success(ok) => MetricReport {
                status: ok.status,
                metric,
                timespan: timespan.to_string(),
                data: Some(ok.data),
                error: None,
                message: None,
                timestamp: ok.timestamp,
                success: true,
            },
            Outcome::Failure(failed) => MetricReport {
                status: failed.status,
                metric,
                timespan: timespan.to_string(),
                data: None,
                error: Some(failed.error),
                message: Some(failed.message),
                timestamp: failed.timestamp,
                success: false,
            },
        };
        Ok(report)
    }

    /// All metrics, fetched one after another
    pub async fn get_all(&self, timespan: &str) -> AllMetricsReport {
        let mut metrics = BTreeMap::new();

        for metric in DesktopMetric::ALL {
            let entry = match self.get_metric(metric, timespan).await {
                Ok(report) => MetricEntry::Report(report),
                Err(err) => {
                    warn!(%metric, error = %err, "metric request failed");
                    MetricEntry::Failed {
                        error: err.to_string(),
                        timestamp: Utc::now(),
                        success: false,
                    }
                }
            };
            metrics.insert(metric, entry);
        }

        AllMetricsReport {
            timespan: timespan.to_string(),
            timestamp: Utc::now(),
            metrics,
        }
    }
}

//! Docker Desktop insights metrics and per-metric reports.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Docker Desktop metric families exposed by the admin insights API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesktopMetric {
    /// Signed-in Desktop users
    Users,
    /// Images pulled and built
    Images,
    /// Installed extensions
    Extensions,
    /// Build activity
    Builds,
    /// Container runs
    Runs,
    /// Overall Desktop usage
    Usage,
}

impl DesktopMetric {
    /// Every metric, in report order
    pub const ALL: [Self; 6] = [
        Self::Users,
        Self::Images,
        Self::Extensions,
        Self::Builds,
        Self::Runs,
        Self::Usage,
    ];

    /// Name used in API paths
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Images => "images",
            Self::Extensions => "extensions",
            Self::Builds => "builds",
            Self::Runs => "runs",
            Self::Usage => "usage",
        }
    }
}

impl fmt::Display for DesktopMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesktopMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown metric \"{s}\". Expected one of: {}",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

/// Summary for one metric, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    /// HTTP status (429 when rate limited)
    pub status: u16,
    /// Metric queried
    pub metric: DesktopMetric,
    /// Timespan queried, e.g. `3m`
    pub timespan: String,
    /// Upstream body on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Upstream body on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    /// Failure summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the response was produced
    pub timestamp: DateTime<Utc>,
    /// Whether the upstream call succeeded
    pub success: bool,
}

//! Request outcomes returned by the API client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of one API client request that reached a decision.
///
/// Upstream HTTP errors and rate limit rejections are outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    /// 2xx response, live or cached
    Success(SuccessOutcome),
    /// Upstream error status or local rate limit rejection
    Failure(FailureOutcome),
}

/// Payload of [`Outcome::Success`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessOutcome {
    /// Always `true`
    pub success: bool,
    /// Upstream HTTP status
    pub status: u16,
    /// Response body; non-JSON bodies become a JSON string
    pub data: Value,
    /// Served from the response cache
    pub cached: bool,
    /// When the outcome was produced
    pub timestamp: DateTime<Utc>,
}

/// Payload of [`Outcome::Failure`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureOutcome {
    /// Always `false`
    pub success: bool,
    /// Upstream HTTP status, or 429 for local rejections
    pub status: u16,
    /// Upstream error body
    pub error: Value,
    /// Human-readable summary, e.g. `API call failed: 404 Not Found`
    pub message: String,
    /// Seconds until the rate limit allows another attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    /// Points left when rate limited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_points: Option<u32>,
    /// When the outcome was produced
    pub timestamp: DateTime<Utc>,
}

impl Outcome {
    /// Successful outcome stamped with the current time
    pub fn success(status: u16, data: Value, cached: bool) -> Self {
        Self::Success(SuccessOutcome {
            success: true,
            status,
            data,
            cached,
            timestamp: Utc::now(),
        })
    }

    /// Failed outcome stamped with the current time
    pub fn failure(status: u16, error: Value, message: impl Into<String>) -> Self {
        Self::Failure(FailureOutcome {
            success: false,
            status,
            error,
            message: message.into(),
            retry_after: None,
            remaining_points: None,
            timestamp: Utc::now(),
        })
    }

    /// 429 outcome produced locally when the rate budget is exhausted
    pub fn rate_limited(retry_after: u64, remaining_points: u32) -> Self {
        Self::Failure(FailureOutcome {
            success: false,
            status: 429,
            error: Value::String("Rate limit exceeded".to_string()),
            message: format!("Rate limit exceeded. Retry after {retry_after} seconds"),
            retry_after: Some(retry_after),
            remaining_points: Some(remaining_points),
            timestamp: Utc::now(),
        })
    }

    /// Whether this is a success
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// HTTP status of either variant
    pub const fn status(&self) -> u16 {
        match self {
            Self::Success(s) => s.status,
            Self::Failure(f) => f.status,
        }
    }

    /// Whether this success came from the cache
    pub const fn is_cached(&self) -> bool {
        matches!(self, Self::Success(SuccessOutcome { cached: true, .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_limited_serializes_camel_case() {
        let value = serde_json::to_value(Outcome::rate_limited(3, 0)).unwrap();

        assert_eq!(value["success"], json!(false));
        assert_eq!(value["status"], json!(429));
        assert_eq!(value["retryAfter"], json!(3));
        assert_eq!(value["remainingPoints"], json!(0));
    }

    #[test]
    fn test_failure_omits_rate_fields() {
        let value = serde_json::to_value(Outcome::failure(
            404,
            json!({"detail": "missing"}),
            "API call failed: 404 Not Found",
        ))
        .unwrap();

        assert!(value.get("retryAfter").is_none());
        assert_eq!(value["message"], json!("API call failed: 404 Not Found"));
    }

    #[test]
    fn test_success_accessors() {
        let outcome = Outcome::success(200, json!([1, 2]), true);
        assert!(outcome.is_success());
        assert!(outcome.is_cached());
        assert_eq!(outcome.status(), 200);
    }
}

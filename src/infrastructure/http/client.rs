//! Authenticated, rate-limited, cached HTTP client.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::auth::AuthStrategy;
use super::cache::{cache_key, ClearResult, ResponseCache};
use super::errors::ApiClientError;
use super::rate_limiter::{RateLimitDecision, RateLimitStatus, RateLimiter};
use crate::domain::models::{Config, Credentials, Outcome, RateLimitConfig};
use crate::infrastructure::logging::scrub_secrets;

const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Configuration for one `ApiClient`
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL every endpoint is appended to
    pub base_url: String,
    /// Credentials applied to each request
    pub credentials: Credentials,
    /// Per-request timeout
    pub timeout: Duration,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Budget per endpoint
    pub rate_limit: RateLimitConfig,
    /// Lifetime of cached GET responses
    pub cache_ttl: Duration,
}

impl ApiClientConfig {
    /// Client for the generic upstream API described by `config.api` and `config.auth`
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            credentials: Credentials::from(&config.auth),
            timeout: Duration::from_secs(config.api.timeout_secs),
            user_agent: config.api.user_agent.clone(),
            rate_limit: config.rate_limit.clone(),
            cache_ttl: Duration::from_secs(config.cache.ttl_secs),
        }
    }

    /// Bearer-authenticated client for the Docker insights API
    pub fn for_insights(config: &Config) -> Self {
        let token = config
            .insights
            .token
            .clone()
            .or_else(|| config.auth.token.clone());

        Self {
            base_url: config.insights.base_url.clone(),
            credentials: Credentials::Bearer { token },
            ..Self::from_config(config)
        }
    }
}

/// HTTP client composing credentials, a per-endpoint rate budget and a
/// TTL cache for GET responses
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: AuthStrategy,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
}

impl ApiClient {
    /// Build the client; nothing is sent until the first request
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(10)
            .build()?;

        info!(
            base_url = %config.base_url,
            auth = ?config.credentials.kind(),
            points = config.rate_limit.points,
            "initializing API client"
        );

        Ok(Self {
            auth: AuthStrategy::new(config.credentials, http.clone()),
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::from_config(&config.rate_limit)),
            cache: Arc::new(ResponseCache::new(config.cache_ttl)),
        })
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue `method endpoint` against the base URL.
    ///
    /// Rate limit rejections and upstream error statuses come back as
    /// `Outcome::Failure`; only configuration and transport problems are errors.
    #[instrument(skip(self, payload), fields(base_url = %self.base_url))]
    pub async fn request(
        &self,
        method: &str,
        endpoint: &str,
        payload: Option<&Value>,
        use_cache: bool,
    ) -> Result<Outcome, ApiClientError> {
        let method = parse_method(method)?;
        validate_endpoint(endpoint)?;

        let url = format!("{}{endpoint}", self.base_url);

        if let RateLimitDecision::Limited {
            remaining_points,
            ms_before_next,
            ..
        } = self.limiter.consume(&url)
        {
            let retry_after = ms_before_next.div_ceil(1000);
            warn!(endpoint, retry_after, "request rejected by rate limiter");
            return Ok(Outcome::rate_limited(retry_after, remaining_points));
        }

        let cache_key = (method == Method::GET && use_cache)
            .then(|| cache_key(method.as_str(), endpoint, payload));

        if let Some(key) = &cache_key {
            if let Some(data) = self.cache.get(key) {
                debug!(endpoint, "serving cached response");
                return Ok(Outcome::success(StatusCode::OK.as_u16(), data, true));
            }
        }

        let mut response = self.dispatch(&method, &url, payload).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.auth.can_refresh() {
            info!(endpoint, "upstream returned 401, refreshing token and replaying once");
            self.auth.refresh().await?;
            response = self.dispatch(&method, &url, payload).await?;
        }

        let status = response.status();
        let body = read_body(response).await?;

        if status.is_success() {
            if let Some(key) = cache_key {
                self.cache.set(key, body.clone());
            }
            return Ok(Outcome::success(status.as_u16(), body, false));
        }

        let message = format!(
            "API call failed: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        );
        warn!(
            endpoint,
            status = status.as_u16(),
            body = %scrub_secrets(&body.to_string()),
            "upstream request failed"
        );

        Ok(Outcome::failure(status.as_u16(), body, message.trim_end()))
    }

    async fn dispatch(
        &self,
        method: &Method,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<Response, ApiClientError> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(payload) = payload {
            if *method == Method::GET {
                request = request.query(&query_pairs(payload));
            } else {
                request = request.json(payload);
            }
        }

        let request = self.auth.apply(request).await?;
        debug!(%method, url, "dispatching request");

        Ok(request.send().await?)
    }

    /// Budget for `endpoint` without consuming it
    pub fn rate_limit_status(&self, endpoint: &str) -> RateLimitStatus {
        self.limiter.status(&format!("{}{endpoint}", self.base_url))
    }

    /// Remove cached responses whose key contains `pattern`, or all of them
    pub fn clear_cache(&self, pattern: Option<&str>) -> ClearResult {
        let result = self.cache.clear(pattern);
        info!(?pattern, ?result, "cache cleared");
        result
    }

    /// Periodically purge expired cache entries and idle rate limit budgets.
    ///
    /// The task stops once the client is dropped.
    pub fn spawn_maintenance(&self, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(&self.cache);
        let limiter = Arc::downgrade(&self.limiter);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let (Some(cache), Some(limiter)) = (cache.upgrade(), limiter.upgrade()) else {
                    break;
                };
                let purged = cache.purge_expired();
                let pruned = limiter.prune_idle();
                if purged + pruned > 0 {
                    debug!(purged, pruned, "maintenance sweep");
                }
            }
        })
    }
}

fn parse_method(method: &str) -> Result<Method, ApiClientError> {
    let upper = method.trim().to_uppercase();
    SUPPORTED_METHODS
        .into_iter()
        .find(|m| m.as_str() == upper)
        .ok_or_else(|| ApiClientError::InvalidMethod(method.to_string()))
}

fn validate_endpoint(endpoint: &str) -> Result<(), ApiClientError> {
    if !endpoint.starts_with('/') {
        return Err(ApiClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "must start with '/'".to_string(),
        });
    }
    if endpoint.starts_with("//") || endpoint.contains("://") {
        return Err(ApiClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: "must be a path relative to the base URL".to_string(),
        });
    }
    Ok(())
}

/// GET payload objects become query parameters; strings are sent verbatim,
/// other values as their JSON text.
fn query_pairs(payload: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = payload else {
        return Vec::new();
    };

    map.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// JSON bodies are parsed; anything else is kept as a JSON string
async fn read_body(response: Response) -> Result<Value, ApiClientError> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_method_is_case_insensitive() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("Patch").unwrap(), Method::PATCH);
        assert!(matches!(
            parse_method("TRACE").unwrap_err(),
            ApiClientError::InvalidMethod(m) if m == "TRACE"
        ));
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("/users/1").is_ok());
        assert!(validate_endpoint("users").is_err());
        assert!(validate_endpoint("//evil.test/x").is_err());
        assert!(validate_endpoint("/redirect?to=http://x").is_err());
    }

    #[test]
    fn test_query_pairs_flattens_scalars() {
        let pairs = query_pairs(&json!({"q": "rust", "page": 2, "skip": null, "exact": true}));
        assert_eq!(
            pairs,
            vec![
                ("exact".to_string(), "true".to_string()),
                ("page".to_string(), "2".to_string()),
                ("q".to_string(), "rust".to_string()),
            ]
        );
        assert!(query_pairs(&json!([1, 2])).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_maintenance_purges_and_stops_with_client() {
        let mut config = ApiClientConfig::from_config(&Config::default());
        config.cache_ttl = Duration::from_secs(1);
        let client = ApiClient::new(config).unwrap();
        client.cache.set("GET:/a:x", json!(1));
        client.limiter.consume("https://api.example.com/a");

        let handle = client.spawn_maintenance(Duration::from_secs(120));
        tokio::time::sleep(Duration::from_secs(121)).await;
        assert!(client.cache.is_empty());
        assert_eq!(client.limiter.prune_idle(), 0);

        drop(client);
        tokio::time::sleep(Duration::from_secs(121)).await;
        assert!(handle.is_finished());
    }

    #[test]
    fn test_insights_config_falls_back_to_auth_token() {
        let mut config = Config::default();
        config.auth.token = Some("shared".to_string());

        let insights = ApiClientConfig::for_insights(&config);
        assert_eq!(insights.base_url, "https://api.docker.com");
        assert_eq!(insights.credentials, Credentials::bearer("shared"));

        config.insights.token = Some("dedicated".to_string());
        let insights = ApiClientConfig::for_insights(&config);
        assert_eq!(insights.credentials, Credentials::bearer("dedicated"));
    }
}

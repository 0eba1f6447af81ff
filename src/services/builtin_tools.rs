//! Tools shipped with the chat relay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use crate::domain::errors::ToolError;
use crate::domain::models::ToolsConfig;
use crate::domain::ports::Tool;
use crate::services::tool_registry::ToolRegistry;

const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

fn string_param<'a>(tool: &str, parameters: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    parameters
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::validation(tool, format!("missing string field '{key}'")))
}

fn string_schema(fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|field| ((*field).to_string(), json!({ "type": "string" })))
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": fields,
    })
}

fn parse_base(tool: &str, base_url: &str) -> Result<Url, ToolError> {
    Url::parse(base_url)
        .map_err(|e| ToolError::execution(format!("{tool}: invalid base URL {base_url}: {e}")))
}

/// Returns its input unchanged
#[derive(Debug, Default)]
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the input string"
    }

    fn parameter_schema(&self) -> Value {
        string_schema(&["text"])
    }

    async fn execute(&self, parameters: Value) -> Result<String, ToolError> {
        Ok(string_param(self.name(), &parameters, "text")?.to_string())
    }
}

/// One-line current conditions from a wttr.in compatible service
#[derive(Debug)]
pub struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    /// Tool querying `base_url`
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Fetch current weather for a given city"
    }

    fn parameter_schema(&self) -> Value {
        string_schema(&["location"])
    }

    async fn execute(&self, parameters: Value) -> Result<String, ToolError> {
        let location = string_param(self.name(), &parameters, "location")?;

        let mut url = parse_base(self.name(), &self.base_url)?;
        url.path_segments_mut()
            .map_err(|()| ToolError::execution("weather: base URL cannot hold a path"))?
            .pop_if_empty()
            .push(location);
        url.set_query(Some("format=3"));

        let response = self.http.get(url).send().await?;
        Ok(response.text().await?)
    }
}

/// Instant-answer lookup against a DuckDuckGo compatible API
#[derive(Debug)]
pub struct SearchTool {
    http: reqwest::Client,
    base_url: String,
}

impl SearchTool {
    /// Tool querying `base_url`
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search DuckDuckGo for a query"
    }

    fn parameter_schema(&self) -> Value {
        string_schema(&["query"])
    }

    async fn execute(&self, parameters: Value) -> Result<String, ToolError> {
        let query = string_param(self.name(), &parameters, "query")?;

        let mut url = parse_base(self.name(), &self.base_url)?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json");

        let body: Value = self.http.get(url).send().await?.json().await?;
        serde_json::to_string_pretty(&body).map_err(|e| ToolError::execution(e.to_string()))
    }
}

/// GET an arbitrary URL with a caller-supplied bearer token
#[derive(Debug)]
pub struct ExternalApiTool {
    http: reqwest::Client,
}

impl ExternalApiTool {
    /// Tool sharing `http`
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Tool for ExternalApiTool {
    fn name(&self) -> &str {
        "externalApi"
    }

    fn description(&self) -> &str {
        "Call a protected API"
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "pattern": "^https?://" },
                "token": { "type": "string" }
            },
            "required": ["url", "token"]
        })
    }

    async fn execute(&self, parameters: Value) -> Result<String, ToolError> {
        let raw_url = string_param(self.name(), &parameters, "url")?;
        let token = string_param(self.name(), &parameters, "token")?;
        let url = Url::parse(raw_url)
            .map_err(|e| ToolError::validation(self.name(), format!("invalid url: {e}")))?;

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::execution(format!(
                "API call failed: {}",
                status.as_u16()
            )));
        }
        Ok(response.text().await?)
    }
}

/// Registry holding echo, weather, search and externalApi
pub fn default_registry(config: &ToolsConfig) -> anyhow::Result<ToolRegistry> {
    let http = reqwest::Client::builder()
        .timeout(TOOL_TIMEOUT)
        .build()?;

    let registry = ToolRegistry::new()
        .with_tool(Arc::new(EchoTool))?
        .with_tool(Arc::new(WeatherTool::new(
            http.clone(),
            config.weather_base_url.clone(),
        )))?
        .with_tool(Arc::new(SearchTool::new(
            http.clone(),
            config.search_base_url.clone(),
        )))?
        .with_tool(Arc::new(ExternalApiTool::new(http)))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_echo_returns_text() {
        let out = EchoTool.execute(json!({ "text": "hi" })).await.unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn test_weather_encodes_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/New%20York"))
            .and(query_param("format", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("New York: +20°C"))
            .expect(1)
            .mount(&server)
            .await;

        let tool = WeatherTool::new(reqwest::Client::new(), server.uri());
        let out = tool.execute(json!({ "location": "New York" })).await.unwrap();
        assert_eq!(out, "New York: +20°C");
    }

    #[tokio::test]
    async fn test_search_pretty_prints_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "rust"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Heading": "Rust" })))
            .mount(&server)
            .await;

        let tool = SearchTool::new(reqwest::Client::new(), server.uri());
        let out = tool.execute(json!({ "query": "rust" })).await.unwrap();
        assert_eq!(out, "{\n  \"Heading\": \"Rust\"\n}");
    }

    #[tokio::test]
    async fn test_external_api_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let tool = ExternalApiTool::new(reqwest::Client::new());
        let out = tool
            .execute(json!({ "url": format!("{}/data", server.uri()), "token": "abc" }))
            .await
            .unwrap();
        assert_eq!(out, "ok");
    }

    #[tokio::test]
    async fn test_external_api_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tool = ExternalApiTool::new(reqwest::Client::new());
        let err = tool
            .execute(json!({ "url": server.uri(), "token": "abc" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "API call failed: 403");
    }

    #[test]
    fn test_default_registry_contents() {
        let registry = default_registry(&ToolsConfig::default()).unwrap();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["echo", "externalApi", "search", "weather"]
        );
    }

    #[test]
    fn test_external_api_schema_rejects_non_url() {
        let registry = default_registry(&ToolsConfig::default()).unwrap();
        assert!(registry
            .validate("externalApi", &json!({ "url": "ftp://x", "token": "t" }))
            .is_err());
        assert!(registry
            .validate("externalApi", &json!({ "url": "https://x", "token": "t" }))
            .is_ok());
    }
}

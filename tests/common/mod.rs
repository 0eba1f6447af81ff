//! Common test utilities for integration tests
//!
//! Provides shared fixtures and helpers used across multiple integration
//! test files.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use apirelay::domain::models::{Credentials, RateLimitConfig};
use apirelay::domain::ports::{TokenStream, TokenStreamer};
use apirelay::infrastructure::http::{ApiClient, ApiClientConfig};
use async_trait::async_trait;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Client config against a mock server with a generous budget
pub fn api_config(base_url: &str, credentials: Credentials) -> ApiClientConfig {
    ApiClientConfig {
        base_url: base_url.to_string(),
        credentials,
        timeout: Duration::from_secs(5),
        user_agent: "apirelay-tests".to_string(),
        rate_limit: RateLimitConfig::default(),
        cache_ttl: Duration::from_secs(300),
    }
}

pub fn api_client(base_url: &str, credentials: Credentials) -> Arc<ApiClient> {
    Arc::new(ApiClient::new(api_config(base_url, credentials)).unwrap())
}

/// One step of a scripted model stream
#[derive(Debug, Clone)]
pub enum Step {
    Token(&'static str),
    Fail(&'static str),
}

/// Model backend replaying a fixed script and recording the system instruction
#[derive(Debug, Default)]
pub struct ScriptedStreamer {
    steps: Vec<Step>,
    fail_to_open: bool,
    pub seen_system: Mutex<Option<String>>,
}

impl ScriptedStreamer {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    pub fn tokens(tokens: &[&'static str]) -> Self {
        Self::new(tokens.iter().copied().map(Step::Token).collect())
    }

    pub fn unavailable() -> Self {
        Self {
            fail_to_open: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TokenStreamer for ScriptedStreamer {
    async fn stream_text(&self, system: &str, _prompt: &str) -> anyhow::Result<TokenStream> {
        *self.seen_system.lock().unwrap() = Some(system.to_string());
        if self.fail_to_open {
            anyhow::bail!("model API unavailable");
        }

        let items: Vec<anyhow::Result<String>> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Token(token) => Ok((*token).to_string()),
                Step::Fail(message) => Err(anyhow::anyhow!(*message)),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

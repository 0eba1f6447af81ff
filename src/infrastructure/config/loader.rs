//! Layered configuration loading and validation.

use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::value::Uncased;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A base URL is not http(s)
    #[error("Invalid {field}: {value:?}. Must be an http(s) URL")]
    InvalidUrl {
        /// Config key
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// Zero request budget
    #[error("Invalid rate limit points: {0}. Must be at least 1")]
    InvalidRateLimitPoints(u32),

    /// Rate limit window out of range
    #[error("Invalid rate limit duration: {0}s. Must be between 1 and 31536000")]
    InvalidRateLimitDuration(u64),

    /// Rate limit block period out of range
    #[error("Invalid rate limit block duration: {0}s. Must be at most 31536000")]
    InvalidRateLimitBlockDuration(u64),

    /// Zero cache lifetime
    #[error("Invalid cache ttl: {0}s. Must be at least 1")]
    InvalidCacheTtl(u64),

    /// Unknown log level
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown log format
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// Any other invalid setting
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Upper bound for rate limit windows and blocks (one year)
const MAX_RATE_LIMIT_PERIOD_SECS: u64 = 365 * 24 * 60 * 60;

/// Flat environment names accepted for compatibility with existing deployments,
/// mapped onto their nested config keys.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("AUTH_TYPE", "auth.type"),
    ("BEARER_TOKEN", "auth.token"),
    ("API_KEY", "auth.api_key"),
    ("CLIENT_ID", "auth.client_id"),
    ("CLIENT_SECRET", "auth.client_secret"),
    ("TOKEN_URL", "auth.token_url"),
    ("OAUTH2_ACCESS_TOKEN", "auth.access_token"),
    ("API_BASE_URL", "api.base_url"),
    ("DOCKER_INSIGHTS_API_HOST", "insights.base_url"),
    ("ANTHROPIC_API_KEY", "claude.api_key"),
    ("HTTP_PORT", "server.port"),
    ("RATE_LIMIT_POINTS", "rate_limit.points"),
    ("RATE_LIMIT_DURATION", "rate_limit.duration_secs"),
    ("RATE_LIMIT_BLOCK_DURATION", "rate_limit.block_duration_secs"),
    ("CACHE_TTL", "cache.ttl_secs"),
];

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .apirelay/config.yaml (project config)
    /// 3. .apirelay/local.yaml (project local overrides, optional)
    /// 4. Environment variables (APIRELAY_* prefix, `__` separates nesting)
    /// 5. Legacy flat environment variables (`BEARER_TOKEN`, `HTTP_PORT`, ...);
    ///    `API_TOKEN` only applies when `BEARER_TOKEN` is unset
    pub fn load() -> Result<Config> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".apirelay/config.yaml"))
            .merge(Yaml::file(".apirelay/local.yaml"));

        Self::finish(figment)
    }

    /// Load configuration from a specific file, still honoring environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path));

        Self::finish(figment)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn finish(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .merge(Env::prefixed("APIRELAY_").split("__"))
            .merge(Env::raw().only(&["API_TOKEN"]).map(|_| Uncased::from("auth.token")))
            .merge(legacy_env())
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        validate_url("api.base_url", &config.api.base_url)?;
        validate_url("insights.base_url", &config.insights.base_url)?;
        validate_url("claude.base_url", &config.claude.base_url)?;
        validate_url("server.agent_base_url", &config.server.agent_base_url)?;
        if let Some(token_url) = &config.auth.token_url {
            validate_url("auth.token_url", token_url)?;
        }

        if config.rate_limit.points == 0 {
            return Err(ConfigError::InvalidRateLimitPoints(config.rate_limit.points));
        }

        if config.rate_limit.duration_secs == 0
            || config.rate_limit.duration_secs > MAX_RATE_LIMIT_PERIOD_SECS
        {
            return Err(ConfigError::InvalidRateLimitDuration(
                config.rate_limit.duration_secs,
            ));
        }

        if config.rate_limit.block_duration_secs > MAX_RATE_LIMIT_PERIOD_SECS {
            return Err(ConfigError::InvalidRateLimitBlockDuration(
                config.rate_limit.block_duration_secs,
            ));
        }

        if config.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidCacheTtl(config.cache.ttl_secs));
        }

        if config.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "api.timeout_secs must be at least 1".to_string(),
            ));
        }

        if config.server.agent_name.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "server.agent_name cannot be empty".to_string(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

fn validate_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let valid = (value.starts_with("http://") || value.starts_with("https://"))
        && value.split("://").nth(1).is_some_and(|rest| !rest.is_empty());

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}

fn legacy_env() -> Env {
    let names: Vec<&str> = LEGACY_ENV_KEYS.iter().map(|(name, _)| *name).collect();

    Env::raw().only(&names).map(|key| {
        LEGACY_ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map_or_else(|| Uncased::from(key.as_str().to_owned()), |(_, path)| Uncased::from(*path))
    })
}

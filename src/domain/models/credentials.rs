//! Credentials for the upstream API.
//!
//! Secrets never appear in `Debug` output.

use std::fmt;

use super::config::{AuthConfig, AuthType};

/// Credential configuration owned by one API client.
///
/// Fields stay optional so that a misconfigured credential is reported as an
/// `AuthConfiguration` error on first use rather than at start-up.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer {
        /// Bearer token
        token: Option<String>,
    },
    /// `X-API-Key: <key>`
    ApiKey {
        /// API key
        key: Option<String>,
    },
    /// OAuth2 client-credentials grant
    OAuth2 {
        /// Client id sent to the token endpoint
        client_id: Option<String>,
        /// Client secret sent to the token endpoint
        client_secret: Option<String>,
        /// Token endpoint URL
        token_url: Option<String>,
        /// Token to use until the first refresh
        initial_access_token: Option<String>,
    },
}

impl Credentials {
    /// Bearer credentials with a fixed token
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: Some(token.into()),
        }
    }

    /// API key credentials
    pub fn api_key(key: impl Into<String>) -> Self {
        Self::ApiKey {
            key: Some(key.into()),
        }
    }

    /// OAuth2 client credentials without a pre-issued token
    pub fn oauth2(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self::OAuth2 {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            token_url: Some(token_url.into()),
            initial_access_token: None,
        }
    }

    /// Scheme of these credentials
    pub const fn kind(&self) -> AuthType {
        match self {
            Self::Bearer { .. } => AuthType::Bearer,
            Self::ApiKey { .. } => AuthType::ApiKey,
            Self::OAuth2 { .. } => AuthType::OAuth2,
        }
    }
}

impl From<&AuthConfig> for Credentials {
    fn from(auth: &AuthConfig) -> Self {
        match auth.auth_type {
            AuthType::Bearer => Self::Bearer {
                token: auth.token.clone(),
            },
            AuthType::ApiKey => Self::ApiKey {
                key: auth.api_key.clone(),
            },
            AuthType::OAuth2 => Self::OAuth2 {
                client_id: auth.client_id.clone(),
                client_secret: auth.client_secret.clone(),
                token_url: auth.token_url.clone(),
                initial_access_token: auth.access_token.clone(),
            },
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| if value.is_some() { "[REDACTED]" } else { "<unset>" };

        match self {
            Self::Bearer { token } => f.debug_struct("Bearer").field("token", &redact(token)).finish(),
            Self::ApiKey { key } => f.debug_struct("ApiKey").field("key", &redact(key)).finish(),
            Self::OAuth2 {
                client_id,
                client_secret,
                token_url,
                initial_access_token,
            } => f
                .debug_struct("OAuth2")
                .field("client_id", client_id)
                .field("client_secret", &redact(client_secret))
                .field("token_url", token_url)
                .field("initial_access_token", &redact(initial_access_token))
                .finish(),
        }
    }
}

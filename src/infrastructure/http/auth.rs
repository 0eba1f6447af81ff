//! Credential application and OAuth2 client-credentials refresh.

use std::fmt;

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::errors::ApiClientError;
use crate::domain::models::Credentials;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Turns a credential configuration into request headers.
///
/// The OAuth2 access token is owned by this instance and replaced on refresh.
pub struct AuthStrategy {
    credentials: Credentials,
    http: reqwest::Client,
    access_token: RwLock<Option<String>>,
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStrategy")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl AuthStrategy {
    /// Strategy for `credentials`, seeded with any pre-issued OAuth2 token
    pub fn new(credentials: Credentials, http: reqwest::Client) -> Self {
        let access_token = match &credentials {
            Credentials::OAuth2 {
                initial_access_token,
                ..
            } => initial_access_token.clone(),
            _ => None,
        };

        Self {
            credentials,
            http,
            access_token: RwLock::new(access_token),
        }
    }

    /// Whether a 401 can be answered with a token refresh
    pub const fn can_refresh(&self) -> bool {
        matches!(self.credentials, Credentials::OAuth2 { .. })
    }

    /// Attach credentials to `request`.
    ///
    /// OAuth2 without a cached token refreshes once before the first dispatch.
    pub async fn apply(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiClientError> {
        match &self.credentials {
            Credentials::Bearer { token } => {
                let token = token.as_deref().ok_or_else(|| {
                    ApiClientError::AuthConfiguration("bearer token is not set".to_string())
                })?;
                Ok(request.bearer_auth(token))
            }
            Credentials::ApiKey { key } => {
                let key = key.as_deref().ok_or_else(|| {
                    ApiClientError::AuthConfiguration("API key is not set".to_string())
                })?;
                Ok(request.header("X-API-Key", key))
            }
            Credentials::OAuth2 { .. } => {
                let cached = self.access_token.read().await.clone();
                let token = match cached {
                    Some(token) => token,
                    None => {
                        debug!("no cached OAuth2 token, refreshing before first request");
                        self.refresh().await?
                    }
                };
                Ok(request.bearer_auth(token))
            }
        }
    }

    /// Request a new access token with the client-credentials grant
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<String, ApiClientError> {
        let Credentials::OAuth2 {
            client_id,
            client_secret,
            token_url,
            ..
        } = &self.credentials
        else {
            return Err(ApiClientError::AuthConfiguration(
                "token refresh is only available for oauth2 credentials".to_string(),
            ));
        };

        let (Some(client_id), Some(client_secret), Some(token_url)) =
            (client_id, client_secret, token_url)
        else {
            return Err(ApiClientError::AuthConfiguration(
                "oauth2 requires client_id, client_secret and token_url".to_string(),
            ));
        };

        let response = self
            .http
            .post(token_url)
            .json(&json!({
                "grant_type": "client_credentials",
                "client_id": client_id,
                "client_secret": client_secret,
            }))
            .send()
            .await
            .map_err(|e| ApiClientError::AuthRefresh(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint rejected refresh");
            return Err(ApiClientError::AuthRefresh(format!(
                "token endpoint returned {status}"
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| ApiClientError::AuthRefresh(e.to_string()))?
            .access_token
            .ok_or_else(|| {
                ApiClientError::AuthRefresh("response did not include access_token".to_string())
            })?;

        *self.access_token.write().await = Some(token.clone());
        info!("OAuth2 access token refreshed");

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn captured_headers(strategy: &AuthStrategy) -> reqwest::header::HeaderMap {
        let request = strategy
            .apply(reqwest::Client::new().get("http://localhost/"))
            .await
            .unwrap()
            .build()
            .unwrap();
        request.headers().clone()
    }

    #[tokio::test]
    async fn test_bearer_header() {
        let strategy = AuthStrategy::new(Credentials::bearer("abc"), reqwest::Client::new());
        let headers = captured_headers(&strategy).await;
        assert_eq!(headers["authorization"], "Bearer abc");
    }

    #[tokio::test]
    async fn test_api_key_header() {
        let strategy = AuthStrategy::new(Credentials::api_key("k-1"), reqwest::Client::new());
        let headers = captured_headers(&strategy).await;
        assert_eq!(headers["x-api-key"], "k-1");
        assert!(headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_missing_bearer_token_is_configuration_error() {
        let strategy =
            AuthStrategy::new(Credentials::Bearer { token: None }, reqwest::Client::new());
        let err = strategy
            .apply(reqwest::Client::new().get("http://localhost/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiClientError::AuthConfiguration(_)));
    }

    #[tokio::test]
    async fn test_oauth2_refreshes_before_first_use() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "grant_type": "client_credentials",
                "client_id": "id",
                "client_secret": "secret",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "t1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let strategy = AuthStrategy::new(
            Credentials::oauth2("id", "secret", format!("{}/token", server.uri())),
            reqwest::Client::new(),
        );

        assert_eq!(captured_headers(&strategy).await["authorization"], "Bearer t1");
        assert_eq!(captured_headers(&strategy).await["authorization"], "Bearer t1");
    }

    #[tokio::test]
    async fn test_oauth2_uses_initial_token_without_refresh() {
        let strategy = AuthStrategy::new(
            Credentials::OAuth2 {
                client_id: None,
                client_secret: None,
                token_url: None,
                initial_access_token: Some("preissued".to_string()),
            },
            reqwest::Client::new(),
        );

        assert_eq!(
            captured_headers(&strategy).await["authorization"],
            "Bearer preissued"
        );
    }

    #[tokio::test]
    async fn test_refresh_missing_fields() {
        let strategy = AuthStrategy::new(
            Credentials::OAuth2 {
                client_id: Some("id".to_string()),
                client_secret: None,
                token_url: None,
                initial_access_token: None,
            },
            reqwest::Client::new(),
        );

        assert!(matches!(
            strategy.refresh().await.unwrap_err(),
            ApiClientError::AuthConfiguration(_)
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_access_token_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let strategy = AuthStrategy::new(
            Credentials::oauth2("id", "secret", format!("{}/token", server.uri())),
            reqwest::Client::new(),
        );

        assert!(matches!(
            strategy.refresh().await.unwrap_err(),
            ApiClientError::AuthRefresh(_)
        ));
    }

    #[tokio::test]
    async fn test_refresh_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let strategy = AuthStrategy::new(
            Credentials::oauth2("id", "bad", format!("{}/token", server.uri())),
            reqwest::Client::new(),
        );

        let err = strategy.refresh().await.unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}

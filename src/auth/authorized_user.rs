//! Authorized user credentials (`gcloud auth application-default login`).
//!
//! Exchanges the stored refresh token for an access token.

use crate::auth::service_account::parse_token_response;
use crate::auth::{AccessToken, TokenCache, TokenProvider};
use crate::defaults::auth::TOKEN_URI;
use crate::error::LlmError;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Clone, Deserialize)]
pub struct AuthorizedUserCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub quota_project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl std::fmt::Debug for AuthorizedUserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUserCredentials")
            .field("client_id", &self.client_id)
            .field("quota_project_id", &self.quota_project_id)
            .finish_non_exhaustive()
    }
}

pub struct AuthorizedUserTokenProvider {
    creds: AuthorizedUserCredentials,
    http: reqwest::Client,
    cache: TokenCache,
}

impl AuthorizedUserTokenProvider {
    pub fn new(creds: AuthorizedUserCredentials, http: reqwest::Client) -> Self {
        Self {
            creds,
            http,
            cache: TokenCache::new(),
        }
    }

    pub fn credentials(&self) -> &AuthorizedUserCredentials {
        &self.creds
    }

    /// Perform the refresh-token grant, bypassing the cache.
    pub async fn fetch_token(&self) -> Result<AccessToken, LlmError> {
        let token_uri = self.creds.token_uri.as_deref().unwrap_or(TOKEN_URI);
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.creds.client_id.as_str()),
            ("client_secret", self.creds.client_secret.as_str()),
            ("refresh_token", self.creds.refresh_token.as_str()),
        ];

        tracing::debug!(token_uri = %token_uri, "refreshing authorized user token");

        let resp = self
            .http
            .post(token_uri)
            .form(&form)
            .send()
            .await
            .map_err(|e| LlmError::HttpError(format!("Token endpoint request failed: {e}")))?;

        let tr = parse_token_response(resp).await?;
        Ok(AccessToken::new(tr.access_token, tr.expires_in))
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUserTokenProvider {
    async fn token(&self) -> Result<String, LlmError> {
        self.cache.get_or_refresh(|| self.fetch_token()).await
    }

    async fn project_id(&self) -> Result<Option<String>, LlmError> {
        Ok(self.creds.quota_project_id.clone())
    }
}

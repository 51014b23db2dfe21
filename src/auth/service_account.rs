//! Service Account based Bearer token provider for Google Cloud (Vertex AI).
//!
//! Implements the OAuth 2.0 JWT Bearer grant: a JWT signed with the service
//! account's private key is exchanged for an access token at the token
//! endpoint. Tokens are cached in-memory and refreshed before expiration.

use crate::auth::{AccessToken, TokenCache, TokenProvider};
use crate::defaults::auth::{CLOUD_PLATFORM_SCOPE, JWT_LIFETIME_SECS, TOKEN_URI};
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Service Account credential subset (fields required for JWT flow)
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceAccountCredentials {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountCredentials {
    /// Create from raw fields.
    pub fn new(client_email: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: private_key.into(),
            private_key_id: None,
            project_id: None,
            token_uri: None,
        }
    }

    /// Create from a Service Account JSON string.
    pub fn from_json(json: &str) -> Result<Self, LlmError> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| LlmError::ConfigurationError(format!("Invalid service account JSON: {e}")))
    }

    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(TOKEN_URI)
    }
}

impl std::fmt::Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("project_id", &self.project_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: String,
    aud: &'a str,
    exp: i64,
    iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Service Account based token provider with in-memory caching.
pub struct ServiceAccountTokenProvider {
    creds: ServiceAccountCredentials,
    http: reqwest::Client,
    scopes: Vec<String>,
    subject: Option<String>,
    assertion_override: Option<String>,
    cache: TokenCache,
}

impl ServiceAccountTokenProvider {
    /// Create a new provider.
    /// - `http` can be a shared reqwest client.
    /// - `subject` is an optional user to impersonate (domain-wide delegation).
    pub fn new(
        creds: ServiceAccountCredentials,
        http: reqwest::Client,
        subject: Option<String>,
    ) -> Self {
        Self {
            creds,
            http,
            scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
            subject,
            assertion_override: None,
            cache: TokenCache::new(),
        }
    }

    /// Bypass signing and send a prebuilt assertion (primarily for tests).
    pub fn new_with_assertion_override(
        creds: ServiceAccountCredentials,
        http: reqwest::Client,
        subject: Option<String>,
        assertion: String,
    ) -> Self {
        Self {
            assertion_override: Some(assertion),
            ..Self::new(creds, http, subject)
        }
    }

    /// Replace the requested OAuth scopes. An empty list keeps cloud-platform.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        if !scopes.is_empty() {
            self.scopes = scopes;
        }
        self
    }

    pub fn credentials(&self) -> &ServiceAccountCredentials {
        &self.creds
    }

    fn assertion(&self) -> Result<String, LlmError> {
        if let Some(a) = &self.assertion_override {
            return Ok(a.clone());
        }
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iss: &self.creds.client_email,
            scope: self.scopes.join(" "),
            aud: self.creds.token_uri(),
            iat: now,
            exp: now + JWT_LIFETIME_SECS,
            sub: self.subject.as_deref(),
        };
        sign_rs256(&claims, &self.creds)
    }

    /// Perform the JWT Bearer grant, bypassing the cache.
    pub async fn fetch_token(&self) -> Result<AccessToken, LlmError> {
        let assertion = self.assertion()?;
        let form = [
            ("grant_type", JWT_BEARER_GRANT),
            ("assertion", assertion.as_str()),
        ];

        tracing::debug!(
            client_email = %self.creds.client_email,
            token_uri = %self.creds.token_uri(),
            "exchanging service account assertion"
        );

        let resp = self
            .http
            .post(self.creds.token_uri())
            .form(&form)
            .send()
            .await
            .map_err(|e| LlmError::HttpError(format!("Token endpoint request failed: {e}")))?;

        let tr = parse_token_response(resp).await?;
        Ok(AccessToken::new(tr.access_token, tr.expires_in))
    }
}

#[cfg(feature = "gcp")]
fn sign_rs256(claims: &Claims<'_>, creds: &ServiceAccountCredentials) -> Result<String, LlmError> {
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    let mut header = Header::new(Algorithm::RS256);
    header.typ = Some("JWT".to_string());
    header.kid = creds.private_key_id.clone();
    let key = EncodingKey::from_rsa_pem(creds.private_key.as_bytes())
        .map_err(|e| LlmError::ConfigurationError(format!("Invalid RSA private key (PEM): {e}")))?;
    encode(&header, claims, &key)
        .map_err(|e| LlmError::ConfigurationError(format!("Failed to sign JWT: {e}")))
}

#[cfg(not(feature = "gcp"))]
fn sign_rs256(
    _claims: &Claims<'_>,
    _creds: &ServiceAccountCredentials,
) -> Result<String, LlmError> {
    Err(LlmError::ConfigurationError(
        "Service account credentials require the `gcp` feature".to_string(),
    ))
}

/// Turn a token endpoint response into a [`TokenResponse`], mapping error statuses.
pub(crate) async fn parse_token_response(
    resp: reqwest::Response,
) -> Result<TokenResponse, LlmError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let details = serde_json::from_str::<serde_json::Value>(&body).ok();
        return Err(LlmError::ApiError {
            code: status.as_u16(),
            message: format!("Token endpoint returned error: {body}"),
            details,
        });
    }
    resp.json::<TokenResponse>()
        .await
        .map_err(|e| LlmError::ParseError(format!("Failed to parse token response: {e}")))
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn token(&self) -> Result<String, LlmError> {
        self.cache.get_or_refresh(|| self.fetch_token()).await
    }

    async fn project_id(&self) -> Result<Option<String>, LlmError> {
        Ok(self.creds.project_id.clone())
    }
}

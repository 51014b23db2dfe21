//! Application Default Credentials (ADC) based Bearer token provider for Google Cloud (Vertex AI).
//!
//! Resolution order:
//! 1) Environment variable `GOOGLE_OAUTH_ACCESS_TOKEN`
//! 2) Credentials JSON named by `GOOGLE_APPLICATION_CREDENTIALS`
//! 3) gcloud's well-known `application_default_credentials.json`
//! 4) GCE/GKE metadata server token
//!
//! Credentials are resolved once; afterwards only the token is refreshed.
//! Tokens are cached in-memory and refreshed before expiration.

use crate::auth::authorized_user::AuthorizedUserTokenProvider;
use crate::auth::credentials::{self, CredentialsFile};
use crate::auth::metadata::MetadataClient;
use crate::auth::service_account::ServiceAccountTokenProvider;
use crate::auth::{AccessToken, TokenCache, TokenProvider};
use crate::defaults::auth::{CLOUD_PLATFORM_SCOPE, ENV_TOKEN_LIFETIME_SECS, METADATA_HOST};
use crate::error::LlmError;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use tokio::sync::OnceCell;

/// Where the active credentials came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    CredentialsFile,
    WellKnownFile,
    MetadataServer,
}

/// Inputs to credential discovery.
///
/// [`AdcOptions::from_env`] snapshots the process environment; tests and
/// embedders can fill the fields directly instead.
#[derive(Debug, Clone)]
pub struct AdcOptions {
    /// Pre-obtained access token (`GOOGLE_OAUTH_ACCESS_TOKEN`).
    pub access_token: Option<String>,
    /// Explicit credentials file (`GOOGLE_APPLICATION_CREDENTIALS`).
    pub credentials_file: Option<PathBuf>,
    /// gcloud well-known file; only consulted when it exists.
    pub well_known_file: Option<PathBuf>,
    /// Metadata server host (`GCE_METADATA_HOST`); `None` disables the lookup.
    pub metadata_host: Option<String>,
    /// Project override (`GOOGLE_CLOUD_PROJECT` / `GCLOUD_PROJECT`).
    pub project_id: Option<String>,
    pub scopes: Vec<String>,
}

impl Default for AdcOptions {
    fn default() -> Self {
        Self {
            access_token: None,
            credentials_file: None,
            well_known_file: None,
            metadata_host: Some(METADATA_HOST.to_string()),
            project_id: None,
            scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AdcOptions {
    pub fn from_env() -> Self {
        Self {
            access_token: non_empty_env("GOOGLE_OAUTH_ACCESS_TOKEN"),
            credentials_file: non_empty_env("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
            well_known_file: credentials::well_known_path(),
            metadata_host: Some(
                non_empty_env("GCE_METADATA_HOST").unwrap_or_else(|| METADATA_HOST.to_string()),
            ),
            project_id: non_empty_env("GOOGLE_CLOUD_PROJECT")
                .or_else(|| non_empty_env("GCLOUD_PROJECT")),
            scopes: vec![CLOUD_PLATFORM_SCOPE.to_string()],
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        if !scopes.is_empty() {
            self.scopes = scopes;
        }
        self
    }
}

enum Resolved {
    Static(String),
    ServiceAccount {
        provider: ServiceAccountTokenProvider,
        source: CredentialSource,
        project: Option<String>,
    },
    AuthorizedUser {
        provider: AuthorizedUserTokenProvider,
        source: CredentialSource,
        project: Option<String>,
    },
    Metadata(MetadataClient),
}

impl Resolved {
    fn source(&self) -> CredentialSource {
        match self {
            Self::Static(_) => CredentialSource::Environment,
            Self::ServiceAccount { source, .. } | Self::AuthorizedUser { source, .. } => *source,
            Self::Metadata(_) => CredentialSource::MetadataServer,
        }
    }

    fn file_project(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount { project, .. } | Self::AuthorizedUser { project, .. } => {
                project.as_deref()
            }
            _ => None,
        }
    }
}

/// ADC token provider with caching.
pub struct AdcTokenProvider {
    http: Client,
    options: AdcOptions,
    resolved: OnceCell<Resolved>,
    project: OnceCell<String>,
    cache: TokenCache,
}

impl AdcTokenProvider {
    /// Create a provider with explicit discovery inputs and a custom HTTP client.
    pub fn new(options: AdcOptions, http: Client) -> Self {
        Self {
            http,
            options,
            resolved: OnceCell::new(),
            project: OnceCell::new(),
            cache: TokenCache::new(),
        }
    }

    /// Create a provider from the process environment with a default HTTP client.
    pub fn from_env() -> Self {
        Self::new(AdcOptions::from_env(), Client::new())
    }

    /// Source of the resolved credentials; `None` before the first token request.
    pub fn source(&self) -> Option<CredentialSource> {
        self.resolved.get().map(Resolved::source)
    }

    /// Drop the cached token so the next request fetches a new one.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
    }

    async fn resolved(&self) -> Result<&Resolved, LlmError> {
        self.resolved.get_or_try_init(|| self.load()).await
    }

    async fn load(&self) -> Result<Resolved, LlmError> {
        if let Some(tok) = &self.options.access_token {
            tracing::debug!("using access token from GOOGLE_OAUTH_ACCESS_TOKEN");
            return Ok(Resolved::Static(tok.clone()));
        }

        if let Some(path) = &self.options.credentials_file {
            let file = CredentialsFile::from_path(path).await?;
            tracing::debug!(path = %path.display(), kind = file.kind(), "loaded credentials file");
            return Ok(self.provider_for(file, CredentialSource::CredentialsFile));
        }

        if let Some(path) = &self.options.well_known_file
            && tokio::fs::try_exists(path).await.unwrap_or(false)
        {
            let file = CredentialsFile::from_path(path).await?;
            tracing::debug!(path = %path.display(), kind = file.kind(), "loaded gcloud credentials");
            return Ok(self.provider_for(file, CredentialSource::WellKnownFile));
        }

        if let Some(host) = &self.options.metadata_host {
            tracing::debug!(host = %host, "falling back to metadata server credentials");
            return Ok(Resolved::Metadata(MetadataClient::new(self.http.clone(), host)));
        }

        Err(LlmError::ConfigurationError(
            "ADC resolution failed: no env token, no credentials file, metadata server disabled"
                .to_string(),
        ))
    }

    fn provider_for(&self, file: CredentialsFile, source: CredentialSource) -> Resolved {
        let project = file.project_id().map(str::to_string);
        match file {
            CredentialsFile::ServiceAccount(creds) => Resolved::ServiceAccount {
                provider: ServiceAccountTokenProvider::new(creds, self.http.clone(), None)
                    .with_scopes(self.options.scopes.clone()),
                source,
                project,
            },
            CredentialsFile::AuthorizedUser(creds) => Resolved::AuthorizedUser {
                provider: AuthorizedUserTokenProvider::new(creds, self.http.clone()),
                source,
                project,
            },
        }
    }

    async fn fetch(&self) -> Result<AccessToken, LlmError> {
        match self.resolved().await? {
            // No expiry info; assume short-lived
            Resolved::Static(tok) => Ok(AccessToken::new(
                tok.clone(),
                Some(ENV_TOKEN_LIFETIME_SECS),
            )),
            Resolved::ServiceAccount { provider, .. } => provider.fetch_token().await,
            Resolved::AuthorizedUser { provider, .. } => provider.fetch_token().await,
            Resolved::Metadata(md) => match md.token(&self.options.scopes).await {
                Ok(Some(tok)) => Ok(tok),
                Ok(None) => Err(LlmError::ConfigurationError(
                    "ADC resolution failed: metadata server returned no token".to_string(),
                )),
                Err(e) => Err(LlmError::ConfigurationError(format!(
                    "ADC resolution failed: no env token, no credentials file, metadata server unavailable ({e})"
                ))),
            },
        }
    }

    async fn resolve_project(&self) -> Result<String, LlmError> {
        if let Some(p) = &self.options.project_id {
            return Ok(p.clone());
        }
        let resolved = self.resolved().await?;
        if let Some(p) = resolved.file_project() {
            return Ok(p.to_string());
        }
        let md = match resolved {
            Resolved::Metadata(md) => Some(md.clone()),
            _ => self
                .options
                .metadata_host
                .as_deref()
                .map(|host| MetadataClient::new(self.http.clone(), host)),
        };
        if let Some(md) = md
            && let Ok(Some(p)) = md.project_id().await
        {
            return Ok(p);
        }
        Err(LlmError::ConfigurationError(
            "Could not resolve project_id".to_string(),
        ))
    }
}

#[async_trait]
impl TokenProvider for AdcTokenProvider {
    async fn token(&self) -> Result<String, LlmError> {
        self.cache.get_or_refresh(|| self.fetch()).await
    }

    async fn project_id(&self) -> Result<Option<String>, LlmError> {
        self.project
            .get_or_try_init(|| self.resolve_project())
            .await
            .map(|p| Some(p.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EnvGuard, lock_env};
    use tracing_test::traced_test;

    const ADC_VARS: [&str; 5] = [
        "GOOGLE_OAUTH_ACCESS_TOKEN",
        "GOOGLE_APPLICATION_CREDENTIALS",
        "GCE_METADATA_HOST",
        "GOOGLE_CLOUD_PROJECT",
        "GCLOUD_PROJECT",
    ];

    fn clear_adc_env() -> Vec<EnvGuard> {
        ADC_VARS.iter().map(|&k| EnvGuard::remove(k)).collect()
    }

    #[test]
    fn from_env_reads_discovery_inputs() {
        let _lock = lock_env();
        let _cleared = clear_adc_env();
        let _token = EnvGuard::set("GOOGLE_OAUTH_ACCESS_TOKEN", " env-token ");
        let _file = EnvGuard::set("GOOGLE_APPLICATION_CREDENTIALS", "/tmp/sa.json");
        let _host = EnvGuard::set("GCE_METADATA_HOST", "metadata.internal:8080");
        let _project = EnvGuard::set("GOOGLE_CLOUD_PROJECT", "cloud-proj");
        let _gcloud = EnvGuard::set("GCLOUD_PROJECT", "gcloud-proj");

        let opts = AdcOptions::from_env();
        assert_eq!(opts.access_token.as_deref(), Some("env-token"));
        assert_eq!(opts.credentials_file, Some(PathBuf::from("/tmp/sa.json")));
        assert_eq!(opts.metadata_host.as_deref(), Some("metadata.internal:8080"));
        assert_eq!(opts.project_id.as_deref(), Some("cloud-proj"));
        assert_eq!(opts.scopes, vec![CLOUD_PLATFORM_SCOPE.to_string()]);
    }

    #[test]
    fn from_env_falls_back_to_gcloud_project_and_default_host() {
        let _lock = lock_env();
        let _cleared = clear_adc_env();
        let _blank = EnvGuard::set("GOOGLE_OAUTH_ACCESS_TOKEN", "   ");
        let _gcloud = EnvGuard::set("GCLOUD_PROJECT", "gcloud-proj");

        let opts = AdcOptions::from_env();
        assert!(opts.access_token.is_none());
        assert!(opts.credentials_file.is_none());
        assert_eq!(opts.metadata_host.as_deref(), Some(METADATA_HOST));
        assert_eq!(opts.project_id.as_deref(), Some("gcloud-proj"));
    }

    #[tokio::test]
    async fn project_from_credentials_file_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        tokio::fs::write(
            &path,
            r#"{"type":"authorized_user","client_id":"c","client_secret":"s","refresh_token":"r","quota_project_id":"quota"}"#,
        )
        .await
        .unwrap();

        let provider = AdcTokenProvider::new(
            AdcOptions {
                credentials_file: Some(path),
                ..offline()
            },
            Client::new(),
        );
        assert_eq!(
            provider.project_id().await.unwrap().as_deref(),
            Some("quota")
        );
    }

    fn offline() -> AdcOptions {
        AdcOptions {
            metadata_host: None,
            ..AdcOptions::default()
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn env_token_wins() {
        let provider = AdcTokenProvider::new(
            AdcOptions {
                access_token: Some("env-token".to_string()),
                project_id: Some("p".to_string()),
                ..offline()
            },
            Client::new(),
        );
        assert_eq!(provider.token().await.unwrap(), "env-token");
        assert_eq!(provider.source(), Some(CredentialSource::Environment));
        assert_eq!(provider.project_id().await.unwrap().as_deref(), Some("p"));
        assert!(logs_contain("GOOGLE_OAUTH_ACCESS_TOKEN"));
    }

    #[tokio::test]
    async fn nothing_configured_is_an_error() {
        let provider = AdcTokenProvider::new(offline(), Client::new());
        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
        assert!(provider.source().is_none());
    }

    #[tokio::test]
    async fn missing_project_is_reported() {
        let provider = AdcTokenProvider::new(
            AdcOptions {
                access_token: Some("t".to_string()),
                ..offline()
            },
            Client::new(),
        );
        let err = provider.project_id().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Could not resolve project_id"
        );
    }

    #[tokio::test]
    async fn absent_well_known_file_is_skipped() {
        let provider = AdcTokenProvider::new(
            AdcOptions {
                well_known_file: Some(PathBuf::from("/nonexistent/gcloud/adc.json")),
                ..offline()
            },
            Client::new(),
        );
        let err = provider.token().await.unwrap_err();
        assert!(err.to_string().contains("metadata server disabled"));
    }
}

//! Google Vertex provider builder.
//!
//! Base URL: `https://{location}-aiplatform.googleapis.com/v1/projects/{project}/locations/{location}/publishers/google`
//! (`global` uses `aiplatform.googleapis.com`), unless overridden.

use crate::auth::{AdcOptions, AdcTokenProvider, StaticTokenProvider, TokenProvider};
use crate::defaults::vertex::{DEFAULT_IMAGE_MODEL, DEFAULT_LOCATION};
use crate::error::LlmError;
use crate::types::HttpConfig;
use std::sync::Arc;
use std::time::Duration;

use super::{VertexConfig, VertexImagenClient};

#[derive(Clone, Default)]
pub struct VertexImagenBuilder {
    project: Option<String>,
    location: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    http_config: HttpConfig,
    http_client: Option<reqwest::Client>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl VertexImagenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Vertex project. Falls back to `GOOGLE_VERTEX_PROJECT`, then to the
    /// project attached to the ambient credentials.
    pub fn project<S: Into<String>>(mut self, project: S) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set Vertex location (supports `global`). Falls back to
    /// `GOOGLE_VERTEX_LOCATION`, then `us-central1`.
    pub fn location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Default model id; `imagegeneration` when unset.
    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override base URL (full publisher prefix).
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set Bearer token provider.
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Use a token obtained elsewhere.
    pub fn access_token<S: Into<String>>(self, token: S) -> Self {
        self.token_provider(Arc::new(StaticTokenProvider::new(token)))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http_config.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = Some(timeout);
        self
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.http_config.headers.insert(key.into(), value.into());
        self
    }

    pub fn http_config(mut self, config: HttpConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Reuse an existing client; timeouts and proxy in `HttpConfig` are then ignored.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<VertexImagenClient, LlmError> {
        let project = non_empty(self.project)
            .or_else(|| non_empty(std::env::var("GOOGLE_VERTEX_PROJECT").ok()));
        let location = non_empty(self.location)
            .or_else(|| non_empty(std::env::var("GOOGLE_VERTEX_LOCATION").ok()))
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        let model = match self.model {
            Some(m) if m.trim().is_empty() => {
                return Err(LlmError::ConfigurationError(
                    "Google Vertex requires a non-empty model id".to_string(),
                ));
            }
            Some(m) => m.trim().to_string(),
            None => DEFAULT_IMAGE_MODEL.to_string(),
        };

        let http_client = match self.http_client {
            Some(c) => c,
            None => self.http_config.build_client()?,
        };

        // Fall back to ADC unless the caller already supplied credentials.
        let token_provider = match self.token_provider {
            Some(tp) => Some(tp),
            None if self.http_config.has_authorization() => None,
            None => {
                tracing::debug!("no credentials supplied, using application default credentials");
                let provider: Arc<dyn TokenProvider> = Arc::new(AdcTokenProvider::new(
                    AdcOptions::from_env(),
                    http_client.clone(),
                ));
                Some(provider)
            }
        };

        let config = VertexConfig {
            project,
            location,
            model,
            base_url: non_empty(self.base_url),
            http_config: self.http_config,
            token_provider,
        };

        Ok(VertexImagenClient::new(config, http_client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EnvGuard, lock_env};

    #[test]
    fn project_and_location_fall_back_to_env() {
        let _lock = lock_env();
        let _project = EnvGuard::set("GOOGLE_VERTEX_PROJECT", "env-project");
        let _location = EnvGuard::set("GOOGLE_VERTEX_LOCATION", "asia-northeast1");

        let client = VertexImagenBuilder::new().access_token("t").build().unwrap();
        assert_eq!(client.config().project.as_deref(), Some("env-project"));
        assert_eq!(client.config().location, "asia-northeast1");

        let explicit = VertexImagenBuilder::new()
            .project("p")
            .location("global")
            .access_token("t")
            .build()
            .unwrap();
        assert_eq!(explicit.config().project.as_deref(), Some("p"));
        assert_eq!(explicit.config().location, "global");
    }

    #[test]
    fn blank_env_values_use_defaults() {
        let _lock = lock_env();
        let _project = EnvGuard::remove("GOOGLE_VERTEX_PROJECT");
        let _location = EnvGuard::set("GOOGLE_VERTEX_LOCATION", "  ");

        let client = VertexImagenBuilder::new().access_token("t").build().unwrap();
        assert!(client.config().project.is_none());
        assert_eq!(client.config().location, DEFAULT_LOCATION);
    }

    #[test]
    fn build_auto_enables_adc_token_provider_when_missing_auth() {
        let client = VertexImagenBuilder::new()
            .project("p")
            .location("us-central1")
            .build()
            .expect("build");

        assert!(client.config().token_provider.is_some());
        assert_eq!(client.config().model, "imagegeneration");
    }

    #[test]
    fn build_does_not_override_user_authorization_header() {
        let client = VertexImagenBuilder::new()
            .project("p")
            .header("Authorization", "Bearer user")
            .build()
            .expect("build");

        assert!(
            client.config().token_provider.is_none(),
            "user Authorization should suppress auto ADC"
        );
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = VertexImagenBuilder::new()
            .project("p")
            .access_token("t")
            .model("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn base_url_uses_regional_host() {
        let client = VertexImagenBuilder::new()
            .project("demo")
            .location("europe-west4")
            .access_token("t")
            .build()
            .unwrap();
        assert_eq!(
            client.base_url().await.unwrap(),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/demo/locations/europe-west4/publishers/google"
        );
    }
}

//! Google Vertex AI client (image generation).
//!
//! Sends Imagen `:predict` requests with a Bearer token from the configured
//! [`TokenProvider`] and relays the service's response.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use std::sync::Arc;

use crate::auth::TokenProvider;
use crate::error::LlmError;
use crate::execution::http::headers::{HttpHeaderBuilder, bearer_value};
use crate::observability::mask_secret;
use crate::traits::ImageGenerationCapability;
use crate::types::{HttpConfig, ImageGenerationRequest, ImageGenerationResponse};
use crate::utils::vertex::{normalize_model_id, predict_url, vertex_base_url};

use super::imagen;

/// Config for the Vertex client.
#[derive(Clone)]
pub struct VertexConfig {
    /// Google Cloud project; resolved from the token provider when `None`.
    pub project: Option<String>,
    /// Region such as `us-central1`, or `global`.
    pub location: String,
    /// Default model id (e.g., `imagegeneration`, `imagen-3.0-generate-002`).
    pub model: String,
    /// Full publisher prefix overriding the project/location URL.
    pub base_url: Option<String>,
    /// Per-client HTTP config (headers, timeouts, etc.).
    pub http_config: HttpConfig,
    /// Bearer token provider. An `Authorization` header that is already set
    /// takes precedence.
    pub token_provider: Option<Arc<dyn TokenProvider>>,
}

impl std::fmt::Debug for VertexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ds = f.debug_struct("VertexConfig");
        ds.field("project", &self.project)
            .field("location", &self.location)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("http_config", &self.http_config);

        if self.token_provider.is_some() {
            ds.field("has_token_provider", &true);
        }

        ds.finish()
    }
}

#[derive(Clone, Debug)]
pub struct VertexImagenClient {
    http_client: HttpClient,
    config: VertexConfig,
}

impl VertexImagenClient {
    pub fn new(config: VertexConfig, http_client: HttpClient) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &VertexConfig {
        &self.config
    }

    /// Attach `Authorization: Bearer <token>` unless the request already carries one.
    pub async fn prepare_request(&self, headers: &mut HeaderMap) -> Result<(), LlmError> {
        if headers.contains_key(AUTHORIZATION) {
            return Ok(());
        }
        let Some(tp) = &self.config.token_provider else {
            return Err(LlmError::ConfigurationError(
                "No credentials configured: set a token provider or an Authorization header"
                    .to_string(),
            ));
        };
        let token = tp.token().await?;
        tracing::debug!(token = %mask_secret(&token), "attaching bearer token");
        headers.insert(AUTHORIZATION, bearer_value(&token)?);
        Ok(())
    }

    /// Publisher base URL, resolving the project from ambient credentials when unset.
    pub async fn base_url(&self) -> Result<String, LlmError> {
        if let Some(base) = &self.config.base_url {
            return Ok(base.trim_end_matches('/').to_string());
        }
        let project = match &self.config.project {
            Some(p) => p.clone(),
            None => {
                let from_credentials = match &self.config.token_provider {
                    Some(tp) => tp.project_id().await?,
                    None => None,
                };
                from_credentials.ok_or_else(|| {
                    LlmError::ConfigurationError("Could not resolve project_id".to_string())
                })?
            }
        };
        Ok(vertex_base_url(
            &project,
            &self.config.location,
            crate::defaults::vertex::GOOGLE_PUBLISHER,
        ))
    }

    /// Generate a single image for `prompt` with the default model.
    pub async fn image_generation(
        &self,
        prompt: impl Into<String>,
    ) -> Result<ImageGenerationResponse, LlmError> {
        self.generate_images(ImageGenerationRequest::new(prompt)).await
    }

    async fn predict(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, LlmError> {
        if request.prompt.trim().is_empty() {
            return Err(LlmError::InvalidParameter(
                "prompt must not be empty".to_string(),
            ));
        }
        let model = normalize_model_id(request.model.as_deref().unwrap_or(&self.config.model));
        if model.is_empty() {
            return Err(LlmError::InvalidParameter(
                "model id must not be empty".to_string(),
            ));
        }

        let url = predict_url(&self.base_url().await?, &model);
        let body = serde_json::to_vec(&imagen::build_request_body(&request))?;

        let mut builder = HttpHeaderBuilder::new()
            .with_json_content_type()
            .with_custom_headers(&self.config.http_config.headers)?;
        if let Some(req_http) = &request.http_config {
            builder = builder.with_custom_headers(&req_http.headers)?;
        }
        let mut headers = builder.build();
        self.prepare_request(&mut headers).await?;

        tracing::debug!(url = %url, model = %model, "sending Vertex predict request");

        let mut rb = self.http_client.post(&url).headers(headers).body(body);
        if let Some(timeout) = request.http_config.as_ref().and_then(|c| c.timeout) {
            rb = rb.timeout(timeout);
        }
        let resp = rb
            .send()
            .await
            .map_err(|e| LlmError::HttpError(format!("Vertex request failed: {e}")))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), "Vertex predict request failed");
            return Err(LlmError::ApiError {
                code: status.as_u16(),
                message: format!("Error: {} {}", status.as_u16(), text),
                details: serde_json::from_str(&text).ok(),
            });
        }

        let raw: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse Vertex response: {e}")))?;
        imagen::parse_response(raw, &model)
    }
}

#[async_trait]
impl ImageGenerationCapability for VertexImagenClient {
    async fn generate_images(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, LlmError> {
        self.predict(request).await
    }
}

//! Image generation request and response types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::HttpConfig;

/// Image generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageGenerationRequest {
    /// Text prompt describing the image
    pub prompt: String,
    /// Negative prompt (what to avoid)
    pub negative_prompt: Option<String>,
    /// Number of images to generate; `0` means the service default of one.
    pub count: u32,
    /// Model to use; falls back to the client's default model
    pub model: Option<String>,
    /// Aspect ratio such as `"1:1"` or `"16:9"`
    pub aspect_ratio: Option<String>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Additional `parameters` entries passed through verbatim
    pub extra_params: HashMap<String, serde_json::Value>,
    /// Per-request HTTP configuration (headers, timeout)
    #[serde(skip)]
    pub http_config: Option<HttpConfig>,
}

impl ImageGenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_extra_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_params.insert(key.into(), value);
        self
    }

    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = Some(http_config);
        self
    }
}

/// Image generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    /// Decoded predictions, in response order
    pub images: Vec<GeneratedImage>,
    /// Model id the request was sent to
    pub model: String,
    /// The response body exactly as returned by the service
    pub raw: serde_json::Value,
}

/// A single generated image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Base64 encoded image data
    pub b64_json: Option<String>,
    /// MIME type, as reported by the service or sniffed from the bytes
    pub mime_type: Option<String>,
    /// Prompt rewritten by the service, when prompt enhancement is on
    pub revised_prompt: Option<String>,
    /// Remaining prediction fields
    pub metadata: HashMap<String, serde_json::Value>,
}

impl GeneratedImage {
    /// Decode the base64 payload.
    pub fn bytes(&self) -> Result<Option<Vec<u8>>, crate::error::LlmError> {
        use base64::Engine;

        let Some(b64) = &self.b64_json else {
            return Ok(None);
        };
        base64::engine::general_purpose::STANDARD
            .decode(b64)
            .map(Some)
            .map_err(|e| crate::error::LlmError::ParseError(format!("Invalid base64 image: {e}")))
    }
}

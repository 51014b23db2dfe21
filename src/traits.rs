//! Capability traits implemented by provider clients.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{ImageGenerationRequest, ImageGenerationResponse};

/// Text-to-image generation.
#[async_trait]
pub trait ImageGenerationCapability: Send + Sync {
    async fn generate_images(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, LlmError>;
}

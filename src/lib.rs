//! # vertex-imagen
//!
//! Google Vertex AI image generation with Application Default Credentials.
//!
//! The crate resolves OAuth2 credentials the way Google's client libraries
//! do, caches the access token, attaches it as a Bearer header and sends
//! Imagen `:predict` requests.
//!
//! ```rust,ignore
//! use vertex_imagen::prelude::*;
//!
//! let client = VertexImagenBuilder::new()
//!     .project("my-project")
//!     .location("us-central1")
//!     .build()?;
//! let response = client.image_generation("a watercolor fox").await?;
//! for image in &response.images {
//!     let bytes = image.bytes()?;
//! }
//! ```

pub mod auth;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod observability;
pub mod providers;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::LlmError;

pub mod prelude {
    pub use crate::auth::{AdcOptions, AdcTokenProvider, StaticTokenProvider, TokenProvider};
    pub use crate::error::LlmError;
    pub use crate::providers::vertex::{VertexConfig, VertexImagenBuilder, VertexImagenClient};
    pub use crate::traits::ImageGenerationCapability;
    pub use crate::types::{
        GeneratedImage, HttpConfig, ImageGenerationRequest, ImageGenerationResponse,
    };
}

//! Shared request, response and configuration types.

pub mod http;
pub mod image;

pub use http::{HttpConfig, HttpConfigBuilder};
pub use image::{GeneratedImage, ImageGenerationRequest, ImageGenerationResponse};

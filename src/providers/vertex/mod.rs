//! Google Vertex AI provider.

pub mod builder;
pub mod client;
pub mod imagen;

pub use builder::VertexImagenBuilder;
pub use client::{VertexConfig, VertexImagenClient};

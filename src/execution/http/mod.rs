//! HTTP helpers shared by provider clients.

pub mod headers;

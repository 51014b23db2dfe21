//! HTTP Headers Utility
//!
//! Header construction for Vertex requests.

use crate::error::LlmError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;

/// HTTP header builder for API requests
pub struct HttpHeaderBuilder {
    headers: HeaderMap,
}

impl HttpHeaderBuilder {
    /// Create a new header builder
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// Vertex expects an explicit charset on JSON bodies
    pub fn with_json_content_type(mut self) -> Self {
        self.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(crate::defaults::vertex::JSON_CONTENT_TYPE),
        );
        self
    }

    /// Add multiple custom headers from a HashMap
    pub fn with_custom_headers(
        mut self,
        custom_headers: &HashMap<String, String>,
    ) -> Result<Self, LlmError> {
        for (key, value) in custom_headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                LlmError::ConfigurationError(format!("Invalid header name '{key}': {e}"))
            })?;
            let mut header_value = HeaderValue::from_str(value).map_err(|e| {
                LlmError::ConfigurationError(format!("Invalid header value for '{key}': {e}"))
            })?;
            if header_name == AUTHORIZATION {
                header_value.set_sensitive(true);
            }
            self.headers.insert(header_name, header_value);
        }
        Ok(self)
    }

    /// Build the final HeaderMap
    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

/// `Bearer <token>` header value, marked sensitive so it is elided from debug output.
pub fn bearer_value(token: &str) -> Result<HeaderValue, LlmError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| LlmError::AuthenticationError(format!("Invalid access token format: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

impl Default for HttpHeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! HTTP configuration types.
//!
//! `HttpConfig` and its builder configure the reqwest client used for
//! Vertex requests and token endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Custom headers sent with every Vertex request
    pub headers: HashMap<String, String>,
    /// Proxy settings
    pub proxy: Option<String>,
    /// User agent
    pub user_agent: Option<String>,
}

/// Builder for `HttpConfig`
#[derive(Debug, Clone, Default)]
pub struct HttpConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    headers: HashMap<String, String>,
    proxy: Option<String>,
    user_agent: Option<String>,
}

impl HttpConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn connect_timeout(mut self, connect_timeout: Option<Duration>) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
    pub fn user_agent<S: Into<String>>(mut self, user_agent: Option<S>) -> Self {
        self.user_agent = user_agent.map(|s| s.into());
        self
    }
    pub fn proxy<S: Into<String>>(mut self, proxy: Option<S>) -> Self {
        self.proxy = proxy.map(|s| s.into());
        self
    }
    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Build the configuration. Unset timeouts fall back to crate defaults.
    pub fn build(self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout: self.timeout.or(defaults.timeout),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            headers: self.headers,
            proxy: self.proxy,
            user_agent: self.user_agent.or(defaults.user_agent),
        }
    }
}

impl HttpConfig {
    /// Returns a builder for constructing `HttpConfig`
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::new()
    }

    /// Whether an `Authorization` header is configured (case-insensitive).
    pub fn has_authorization(&self) -> bool {
        self.headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case("authorization"))
    }

    /// Build a reqwest client honoring timeouts, proxy and user agent.
    ///
    /// Custom headers are not installed as client defaults; they are applied
    /// per request so that auth injection can see them.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::LlmError> {
        use crate::error::LlmError;

        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(proxy_url) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| LlmError::ConfigurationError(format!("Invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        builder
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))
    }
}

// Helper module for Duration serialization
mod duration_option_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => d.as_secs().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(crate::defaults::http::REQUEST_TIMEOUT),
            connect_timeout: Some(crate::defaults::http::CONNECT_TIMEOUT),
            headers: HashMap::new(),
            proxy: None,
            user_agent: Some(concat!("vertex-imagen/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

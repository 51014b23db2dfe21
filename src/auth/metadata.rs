//! GCE/GKE metadata server client.

use crate::auth::AccessToken;
use crate::auth::service_account::parse_token_response;
use crate::error::LlmError;
use std::time::Duration;

const METADATA_HEADER: &str = "Metadata-Flavor";
const METADATA_HEADER_VALUE: &str = "Google";
const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";
const PROJECT_PATH: &str = "/computeMetadata/v1/project/project-id";
// Off-GCE the link-local address never answers; do not wait for the full client timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MetadataClient {
    /// `host` is either a bare host (`169.254.169.254`, as in `GCE_METADATA_HOST`)
    /// or a full base URL.
    pub fn new(http: reqwest::Client, host: &str) -> Self {
        let host = host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default service account token. `Ok(None)` when the server answers with an error status.
    pub async fn token(&self, scopes: &[String]) -> Result<Option<AccessToken>, LlmError> {
        let mut req = self
            .http
            .get(format!("{}{TOKEN_PATH}", self.base_url))
            .header(METADATA_HEADER, METADATA_HEADER_VALUE)
            .timeout(PROBE_TIMEOUT);
        if !scopes.is_empty() {
            req = req.query(&[("scopes", scopes.join(","))]);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| LlmError::HttpError(format!("Metadata server request failed: {e}")))?;
        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "metadata server refused token request");
            return Ok(None);
        }
        let tr = parse_token_response(resp).await.map_err(|e| {
            LlmError::ParseError(format!("Failed to parse metadata token response: {e}"))
        })?;
        Ok(Some(AccessToken::new(tr.access_token, tr.expires_in)))
    }

    pub async fn project_id(&self) -> Result<Option<String>, LlmError> {
        let resp = self
            .http
            .get(format!("{}{PROJECT_PATH}", self.base_url))
            .header(METADATA_HEADER, METADATA_HEADER_VALUE)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| LlmError::HttpError(format!("Metadata server request failed: {e}")))?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        let project = resp.text().await?.trim().to_string();
        Ok((!project.is_empty()).then_some(project))
    }
}

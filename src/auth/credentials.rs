//! Credentials file parsing and well-known locations.

use crate::auth::authorized_user::AuthorizedUserCredentials;
use crate::auth::service_account::ServiceAccountCredentials;
use crate::error::LlmError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// A Google credentials JSON file, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialsFile {
    ServiceAccount(ServiceAccountCredentials),
    AuthorizedUser(AuthorizedUserCredentials),
}

impl CredentialsFile {
    pub fn from_json(json: &str) -> Result<Self, LlmError> {
        serde_json::from_str::<Self>(json)
            .map_err(|e| LlmError::ConfigurationError(format!("Unsupported credentials file: {e}")))
    }

    pub async fn from_path(path: &Path) -> Result<Self, LlmError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            LlmError::ConfigurationError(format!(
                "Failed to read credentials file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Project recorded in the file (`project_id` or `quota_project_id`).
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Self::ServiceAccount(sa) => sa.project_id.as_deref(),
            Self::AuthorizedUser(au) => au.quota_project_id.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceAccount(_) => "service_account",
            Self::AuthorizedUser(_) => "authorized_user",
        }
    }
}

/// Path of gcloud's application default credentials file.
///
/// `CLOUDSDK_CONFIG` overrides the gcloud config directory.
pub fn well_known_path() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("CLOUDSDK_CONFIG")
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir).join(WELL_KNOWN_FILE));
    }
    gcloud_config_dir().map(|dir| dir.join(WELL_KNOWN_FILE))
}

#[cfg(windows)]
fn gcloud_config_dir() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(|d| PathBuf::from(d).join("gcloud"))
}

#[cfg(not(windows))]
fn gcloud_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|d| PathBuf::from(d).join(".config").join("gcloud"))
}

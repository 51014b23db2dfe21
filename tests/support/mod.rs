#![allow(dead_code)]

use std::path::PathBuf;

/// Throwaway RSA key used only to exercise JWT signing against mock token endpoints.
pub const TEST_RSA_PRIVATE_KEY: &str = include_str!("../fixtures/test_rsa_key.pem");

// 1x1 transparent PNG
pub const PNG_B64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Write `value` as a credentials file inside `dir`.
pub fn write_credentials(dir: &tempfile::TempDir, value: serde_json::Value) -> PathBuf {
    let path = dir.path().join("credentials.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    path
}

pub fn service_account_json(token_uri: &str, project: Option<&str>) -> serde_json::Value {
    let mut v = serde_json::json!({
        "type": "service_account",
        "private_key_id": "test-kid",
        "private_key": TEST_RSA_PRIVATE_KEY,
        "client_email": "svc@demo.iam.gserviceaccount.com",
        "client_id": "1234567890",
        "token_uri": token_uri,
    });
    if let Some(p) = project {
        v["project_id"] = serde_json::json!(p);
    }
    v
}

pub fn authorized_user_json(token_uri: &str, quota_project: Option<&str>) -> serde_json::Value {
    let mut v = serde_json::json!({
        "type": "authorized_user",
        "client_id": "cid.apps.googleusercontent.com",
        "client_secret": "secret",
        "refresh_token": "1//refresh",
        "token_uri": token_uri,
    });
    if let Some(p) = quota_project {
        v["quota_project_id"] = serde_json::json!(p);
    }
    v
}

/// Removes an environment variable for the lifetime of the guard.
pub struct EnvGuard {
    key: &'static str,
    previous: Option<String>,
}

impl EnvGuard {
    pub fn remove(key: &'static str) -> Self {
        let previous = std::env::var(key).ok();
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, previous }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            unsafe {
                std::env::set_var(self.key, v);
            }
        }
    }
}

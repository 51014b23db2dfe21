//! Authentication helpers and token providers.
//!
//! Providers supply OAuth2 Bearer tokens for Vertex AI. [`adc::AdcTokenProvider`]
//! discovers credentials from the environment the same way Google's client
//! libraries do; the concrete credential flows live in their own modules.

use crate::error::LlmError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use tokio::sync::Mutex;

pub mod adc;
pub mod authorized_user;
pub mod credentials;
pub mod metadata;
pub mod service_account;

pub use adc::{AdcOptions, AdcTokenProvider, CredentialSource};
pub use credentials::CredentialsFile;

/// An asynchronous Bearer token provider.
///
/// Implementations may cache internally and refresh tokens when necessary.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns an access token string suitable for the `Authorization: Bearer <token>` header.
    async fn token(&self) -> Result<String, LlmError>;

    /// Project id associated with the underlying credentials, when known.
    async fn project_id(&self) -> Result<Option<String>, LlmError> {
        Ok(None)
    }
}

/// A static token provider for tokens managed outside this crate.
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    /// Create a new static token provider.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String, LlmError> {
        Ok(self.token.expose_secret().to_string())
    }
}

/// An OAuth2 access token with its expiry.
pub struct AccessToken {
    secret: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// `expires_in` is the lifetime in seconds reported by the token endpoint.
    pub fn new(token: impl Into<String>, expires_in: Option<i64>) -> Self {
        Self {
            secret: SecretString::from(token.into()),
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Usable when it does not expire within the safety window.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(exp) => {
                exp - Duration::seconds(crate::defaults::auth::EXPIRY_SAFETY_WINDOW_SECS) > now
            }
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Single-slot token cache.
///
/// The slot lock is held across a refresh, so concurrent callers wait for the
/// in-flight fetch instead of issuing their own.
#[derive(Default)]
pub(crate) struct TokenCache {
    slot: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<String, LlmError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, LlmError>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(cached) = slot.as_ref()
            && cached.is_usable_at(Utc::now())
        {
            return Ok(cached.secret().to_string());
        }

        let fresh = fetch().await?;
        if fresh.secret().is_empty() {
            return Err(LlmError::AuthenticationError(
                "Could not resolve API token from the environment".to_string(),
            ));
        }
        let token = fresh.secret().to_string();
        *slot = Some(fresh);
        Ok(token)
    }

    pub(crate) async fn clear(&self) {
        *self.slot.lock().await = None;
    }
}

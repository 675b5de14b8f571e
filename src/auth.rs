//! Bearer-token acquisition for the upstream Vertex AI call.
//!
//! The relay authenticates with a short-lived OAuth2 access token. On Cloud
//! Run / GCE the token comes from the instance metadata server; for local
//! development a fixed token can be supplied via `GEMINI_ACCESS_TOKEN`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Error, Result};

/// Access-token wrapper that redacts in Debug/Display and zeroizes on drop.
///
/// Only accessible via `.expose_secret()`, so every call site is auditable
/// via `grep expose_secret`.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Access the raw token value.
    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl std::fmt::Display for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl From<String> for AccessToken {
    fn from(s: String) -> Self {
        AccessToken(SecretString::from(s))
    }
}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        AccessToken(SecretString::from(s))
    }
}

/// Source of bearer tokens for upstream calls.
///
/// Implementations must be safe to share across concurrent requests; any
/// internal refresh is serialized by the provider itself.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Produce a token currently valid for the upstream API.
    async fn token(&self) -> Result<AccessToken>;
}

/// Provider that always returns one fixed token. Used when
/// `GEMINI_ACCESS_TOKEN` is set, and by tests.
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

/// OAuth2 scope requested for upstream calls.
const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default metadata server host on GCE / Cloud Run.
const METADATA_HOST: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed once they are within this margin of expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: AccessToken,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at.saturating_duration_since(Instant::now()) > REFRESH_MARGIN
    }
}

/// Token provider backed by the GCE instance metadata server.
///
/// Caches the token and refreshes it when near expiry. The cache lock is
/// held across the refresh round trip, which serializes concurrent refresh
/// attempts into a single fetch.
pub struct MetadataTokenProvider {
    http: reqwest::Client,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataTokenProvider {
    /// Provider against the real metadata server.
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_host(http, METADATA_HOST)
    }

    /// Provider against an explicit metadata host. Tests point this at a
    /// mock server.
    pub fn with_host(http: reqwest::Client, host: &str) -> Self {
        let token_url = format!(
            "{}{}?scopes={}",
            host.trim_end_matches('/'),
            TOKEN_PATH,
            CLOUD_PLATFORM_SCOPE
        );
        Self {
            http,
            token_url,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let response = self
            .http
            .get(&self.token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| Error::Auth(format!("metadata server unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Auth(format!("metadata server returned {status}")));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Auth(format!("malformed token response: {e}")))?;

        Ok(CachedToken {
            value: AccessToken::from(body.access_token),
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.value.clone());
            }
        }

        let fresh = self.fetch().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);

        tracing::info!("Refreshed upstream access token");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_debug_redaction() {
        let token = AccessToken::from("ya29.super-secret");
        let debug_output = format!("{:?}", token);
        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("ya29"));
    }

    #[test]
    fn test_access_token_display_redaction() {
        let token = AccessToken::from("ya29.super-secret");
        let display_output = format!("{}", token);
        assert_eq!(display_output, "[REDACTED]");
    }

    #[test]
    fn test_access_token_expose_secret() {
        let token = AccessToken::from("the-actual-value");
        assert_eq!(token.expose_secret(), "the-actual-value");
    }

    #[tokio::test]
    async fn test_static_provider_returns_fixed_token() {
        let provider = StaticTokenProvider::new(AccessToken::from("fixed-token"));
        let token = provider.token().await.unwrap();
        assert_eq!(token.expose_secret(), "fixed-token");
    }

    #[test]
    fn test_token_url_includes_scope() {
        let provider =
            MetadataTokenProvider::with_host(reqwest::Client::new(), "http://127.0.0.1:1");
        assert!(provider.token_url.starts_with("http://127.0.0.1:1/computeMetadata"));
        assert!(provider.token_url.contains("scopes=https://www.googleapis.com/auth/cloud-platform"));
    }

    #[test]
    fn test_cached_token_freshness() {
        let fresh = CachedToken {
            value: AccessToken::from("t"),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(fresh.is_fresh());

        let near_expiry = CachedToken {
            value: AccessToken::from("t"),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(!near_expiry.is_fresh());
    }
}

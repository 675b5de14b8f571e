//! Environment-based configuration for gemini-relay.
//!
//! All settings are read once at startup. `GCP_PROJECT_ID` is required and
//! startup fails without it; everything else has a default.

use std::time::Duration;

use crate::auth::AccessToken;

/// Default upstream region.
pub const DEFAULT_REGION: &str = "us-central1";

/// Default published model identifier.
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// Default upstream call timeout, measured from call start.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default HTTP listen port (Cloud Run convention: `PORT`).
const DEFAULT_PORT: u16 = 8080;

/// Process configuration, resolved from environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cloud project the model is served from.
    pub project_id: String,
    /// Upstream region, also the endpoint host prefix.
    pub region: String,
    /// Published model identifier.
    pub model_id: String,
    /// Fixed bearer token for local development. When absent, tokens come
    /// from the instance metadata server.
    pub access_token: Option<AccessToken>,
    /// Timeout for one upstream call, including draining the stream.
    pub timeout: Duration,
    /// Port the HTTP server listens on.
    pub port: u16,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("invalid value for '{var}': {message}")]
    Invalid { var: &'static str, message: String },
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through a custom lookup function.
    ///
    /// The closure-based design makes this testable without touching global
    /// env state. Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let project_id = get("GCP_PROJECT_ID").ok_or(ConfigError::Missing("GCP_PROJECT_ID"))?;
        let region = get("GCP_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());
        let model_id = get("GEMINI_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let access_token = get("GEMINI_ACCESS_TOKEN").map(AccessToken::from);

        let timeout_secs = match get("GEMINI_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                var: "GEMINI_TIMEOUT_SECS",
                message: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                message: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        Ok(Settings {
            project_id,
            region,
            model_id,
            access_token,
            timeout: Duration::from_secs(timeout_secs),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lookup closures keep these tests independent of global env state.

    #[test]
    fn test_missing_project_id_fails() {
        let result = Settings::from_lookup(|_| None);
        assert!(matches!(result, Err(ConfigError::Missing("GCP_PROJECT_ID"))));
    }

    #[test]
    fn test_empty_project_id_fails() {
        let result = Settings::from_lookup(|name| match name {
            "GCP_PROJECT_ID" => Some(String::new()),
            _ => None,
        });
        assert!(matches!(result, Err(ConfigError::Missing("GCP_PROJECT_ID"))));
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_lookup(|name| match name {
            "GCP_PROJECT_ID" => Some("my-proj".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(settings.project_id, "my-proj");
        assert_eq!(settings.region, "us-central1");
        assert_eq!(settings.model_id, "gemini-pro");
        assert!(settings.access_token.is_none());
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.port, 8080);
    }

    #[test]
    fn test_overrides_applied() {
        let settings = Settings::from_lookup(|name| match name {
            "GCP_PROJECT_ID" => Some("other-proj".to_string()),
            "GCP_REGION" => Some("europe-west4".to_string()),
            "GEMINI_MODEL_ID" => Some("gemini-pro-vision".to_string()),
            "GEMINI_ACCESS_TOKEN" => Some("ya29.local-token".to_string()),
            "GEMINI_TIMEOUT_SECS" => Some("120".to_string()),
            "PORT" => Some("9090".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(settings.region, "europe-west4");
        assert_eq!(settings.model_id, "gemini-pro-vision");
        assert_eq!(
            settings.access_token.as_ref().unwrap().expose_secret(),
            "ya29.local-token"
        );
        assert_eq!(settings.timeout, Duration::from_secs(120));
        assert_eq!(settings.port, 9090);
    }

    #[test]
    fn test_invalid_timeout_fails() {
        let result = Settings::from_lookup(|name| match name {
            "GCP_PROJECT_ID" => Some("my-proj".to_string()),
            "GEMINI_TIMEOUT_SECS" => Some("sixty".to_string()),
            _ => None,
        });
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                var: "GEMINI_TIMEOUT_SECS",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_port_fails() {
        let result = Settings::from_lookup(|name| match name {
            "GCP_PROJECT_ID" => Some("my-proj".to_string()),
            "PORT" => Some("eighty".to_string()),
            _ => None,
        });
        assert!(matches!(result, Err(ConfigError::Invalid { var: "PORT", .. })));
    }

    #[test]
    fn test_settings_debug_redacts_token() {
        let settings = Settings::from_lookup(|name| match name {
            "GCP_PROJECT_ID" => Some("my-proj".to_string()),
            "GEMINI_ACCESS_TOKEN" => Some("ya29.do-not-log".to_string()),
            _ => None,
        })
        .unwrap();

        let debug_output = format!("{:?}", settings);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("do-not-log"));
    }
}

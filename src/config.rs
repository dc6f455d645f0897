//! Application configuration loaded from environment variables.
//!
//! The backend URL and anon key are the only values that gate startup: if
//! either is missing or still a deploy-scaffold placeholder, the access
//! gate reports a fatal configuration error before any network call.

use std::env;

/// Scaffold values that deploys sometimes leave behind. Treated the same
/// as a missing value.
const PLACEHOLDER_MARKERS: &[&str] = &["YOUR_", "changeme", "<backend-url>", "<anon-key>"];

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (auth + table storage)
    pub backend_url: String,
    /// Public (anon) API key, sent as the `apikey` header
    pub anon_key: String,
    /// Site origin used as the OAuth `redirect_to` target
    pub site_url: String,
    /// Federated login provider slug (e.g. "discord")
    pub oauth_provider: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            backend_url: env::var("PORTAL_BACKEND_URL")
                .map_err(|_| ConfigError::Missing("PORTAL_BACKEND_URL"))?
                .trim_end_matches('/')
                .to_string(),
            anon_key: env::var("PORTAL_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PORTAL_ANON_KEY"))?,
            site_url: env::var("PORTAL_SITE_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            oauth_provider: env::var("PORTAL_OAUTH_PROVIDER")
                .unwrap_or_else(|_| "discord".to_string()),
        })
    }

    /// Check that the backend connection values are usable.
    ///
    /// Returns an error if either value is empty or a placeholder left
    /// over from deploy scaffolding. This is the only condition that puts
    /// the gate into its terminal `ConfigError` state.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("PORTAL_BACKEND_URL", &self.backend_url),
            ("PORTAL_ANON_KEY", &self.anon_key),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
            if PLACEHOLDER_MARKERS.iter().any(|m| value.contains(m)) {
                return Err(ConfigError::Placeholder(name));
            }
        }
        Ok(())
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            backend_url: "http://localhost:54321".to_string(),
            anon_key: "test-anon-key".to_string(),
            site_url: "http://localhost:5173".to_string(),
            oauth_provider: "discord".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Placeholder value for {0}: fix deployment configuration")]
    Placeholder(&'static str),
}

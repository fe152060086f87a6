//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TOOLDEPOT_API_URL` - Base URL of the backend REST API (e.g. `https://api.example.com/api/`)
//!
//! ## Optional
//! - `TOOLDEPOT_API_TOKEN` - Pre-issued bearer token (skips interactive login)
//! - `TOOLDEPOT_MEMO_PATH` - Memo document path (default: `.tooldepot/memo.json`)
//! - `TOOLDEPOT_SESSION_PATH` - Saved session path (default: `.tooldepot/session.json`)
//! - `TOOLDEPOT_CURRENCY` - Display currency (default: `INR`)
//! - `TOOLDEPOT_CATALOG_TTL_SECS` - Catalog cache lifetime in seconds (default: 300)
//! - `TOOLDEPOT_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use tooldepot_core::CurrencyCode;

const DEFAULT_MEMO_PATH: &str = ".tooldepot/memo.json";
const DEFAULT_SESSION_PATH: &str = ".tooldepot/session.json";
const DEFAULT_CATALOG_TTL_SECS: &str = "300";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "30";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, always ending in `/` so relative paths join under it
    pub api_url: Url,
    /// Optional pre-issued bearer token
    pub api_token: Option<SecretString>,
    /// Where the memo is persisted
    pub memo_path: PathBuf,
    /// Where the signed-in session is persisted
    pub session_path: PathBuf,
    /// Currency used to format amounts
    pub currency: CurrencyCode,
    /// How long catalog responses are cached
    pub catalog_ttl: Duration,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("memo_path", &self.memo_path)
            .field("session_path", &self.session_path)
            .field("currency", &self.currency)
            .field("catalog_ttl", &self.catalog_ttl)
            .field("http_timeout", &self.http_timeout)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let api_url = parse_base_url(&vars.required("TOOLDEPOT_API_URL")?)?;
        let api_token = vars.optional("TOOLDEPOT_API_TOKEN").map(SecretString::from);
        let memo_path = PathBuf::from(vars.or_default("TOOLDEPOT_MEMO_PATH", DEFAULT_MEMO_PATH));
        let session_path =
            PathBuf::from(vars.or_default("TOOLDEPOT_SESSION_PATH", DEFAULT_SESSION_PATH));
        let currency = vars
            .or_default("TOOLDEPOT_CURRENCY", "INR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("TOOLDEPOT_CURRENCY".to_string(), e))?;
        let catalog_ttl = vars.seconds("TOOLDEPOT_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS)?;
        let http_timeout = vars.seconds("TOOLDEPOT_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            api_url,
            api_token,
            memo_path,
            session_path,
            currency,
            catalog_ttl,
            http_timeout,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_url` with every other value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not a valid absolute URL.
    pub fn for_api(api_url: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == "TOOLDEPOT_API_URL").then(|| api_url.to_string()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a whole number of seconds.
    fn seconds(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        self.or_default(key, default)
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Parse the API base URL, appending a trailing slash if needed.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("TOOLDEPOT_API_URL".to_string(), reason);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

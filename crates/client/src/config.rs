//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional.
//! - `PHONEPLACE_API_URL` - Catalog service base URL (default: <http://localhost:8000/api>)
//! - `PHONEPLACE_STATE_DIR` - Directory for persisted session and cart (default: .phoneplace)
//! - `PHONEPLACE_DEMO_ACCOUNTS` - Fall back to the built-in demo accounts when
//!   the auth service is unreachable (default: true)
//! - `PHONEPLACE_REQUEST_TIMEOUT_SECS` - Per-request timeout; unset means none
//! - `PHONEPLACE_CACHE_TTL_SECS` - Product detail cache lifetime (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_STATE_DIR: &str = ".phoneplace";
const DEFAULT_CACHE_TTL_SECS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all endpoints are resolved against
    pub api_url: Url,
    /// Where the file-backed store keeps its state
    pub state_dir: PathBuf,
    /// Whether demo accounts answer when the auth service is down
    pub demo_accounts: bool,
    /// Per-request timeout
    pub request_timeout: Option<Duration>,
    /// Product detail and filter options cache lifetime
    pub cache_ttl: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = get_env_or_default(&lookup, "PHONEPLACE_API_URL", DEFAULT_API_URL);
        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("PHONEPLACE_API_URL".to_string(), e.to_string())
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "PHONEPLACE_API_URL".to_string(),
                "URL cannot carry a path".to_string(),
            ));
        }

        let state_dir =
            PathBuf::from(get_env_or_default(&lookup, "PHONEPLACE_STATE_DIR", DEFAULT_STATE_DIR));

        let demo_accounts = match get_optional_env(&lookup, "PHONEPLACE_DEMO_ACCOUNTS") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "PHONEPLACE_DEMO_ACCOUNTS".to_string(),
                    format!("expected true/false, got {raw:?}"),
                )
            })?,
            None => true,
        };

        let request_timeout = get_optional_env(&lookup, "PHONEPLACE_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_secs("PHONEPLACE_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?;

        let cache_ttl = parse_secs(
            "PHONEPLACE_CACHE_TTL_SECS",
            &get_env_or_default(&lookup, "PHONEPLACE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        )?;

        Ok(Self {
            api_url,
            state_dir,
            demo_accounts,
            request_timeout,
            cache_ttl,
        })
    }
}

fn get_optional_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|s| !s.trim().is_empty())
}

fn get_env_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> String {
    get_optional_env(lookup, key).unwrap_or_else(|| default.to_string())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

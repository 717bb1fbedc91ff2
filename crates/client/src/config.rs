//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `ICYCON_API_BASE` - Backend base URL (fallback: `API_BASE`, then `http://127.0.0.1:8000`)
//! - `ICYCON_API_TIMEOUT_SECS` - Per-request deadline in seconds (default: none)
//! - `ICYCON_STATE_DIR` - Directory for persisted credentials (default: `.icycon`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Base URL used when no override is configured.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// State directory used when `ICYCON_STATE_DIR` is unset.
pub const DEFAULT_STATE_DIR: &str = ".icycon";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub api_base: String,
    /// Optional request deadline; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Directory holding the file-backed credential storage
    pub state_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: None,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is not an absolute http(s) URL
    /// or the timeout is not a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base = match get_api_base_override() {
            Some((key, value)) => normalize_api_base(&value)
                .map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))?,
            None => DEFAULT_API_BASE.to_string(),
        };

        let timeout = get_optional_env("ICYCON_API_TIMEOUT_SECS")
            .map(|value| parse_timeout(&value))
            .transpose()
            .map_err(|reason| {
                ConfigError::InvalidEnvVar("ICYCON_API_TIMEOUT_SECS".to_string(), reason)
            })?;

        let state_dir = PathBuf::from(get_env_or_default("ICYCON_STATE_DIR", DEFAULT_STATE_DIR));

        Ok(Self {
            api_base,
            timeout,
            state_dir,
        })
    }

    /// Configuration pointing at an explicit base URL, everything else default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base` is not an absolute http(s) URL.
    pub fn with_api_base(api_base: &str) -> Result<Self, ConfigError> {
        let api_base = normalize_api_base(api_base)
            .map_err(|reason| ConfigError::InvalidEnvVar("api_base".to_string(), reason))?;
        Ok(Self {
            api_base,
            ..Self::default()
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Find the first non-blank base URL override, primary key first.
fn get_api_base_override() -> Option<(&'static str, String)> {
    ["ICYCON_API_BASE", "API_BASE"].into_iter().find_map(|key| {
        get_optional_env(key)
            .filter(|value| !value.trim().trim_end_matches('/').is_empty())
            .map(|value| (key, value))
    })
}

/// Trim whitespace and trailing slashes, then require an absolute http(s) URL.
fn normalize_api_base(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(trimmed.to_string())
}

fn parse_timeout(raw: &str) -> Result<Duration, String> {
    let secs = raw.trim().parse::<u64>().map_err(|e| e.to_string())?;
    if secs == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_trailing_slashes() {
        assert_eq!(
            normalize_api_base("https://api.icycon.io//").unwrap(),
            "https://api.icycon.io"
        );
        assert_eq!(
            normalize_api_base(" http://10.0.0.2:8000/backend/ ").unwrap(),
            "http://10.0.0.2:8000/backend"
        );
    }

    #[test]
    fn test_normalize_rejects_relative_and_other_schemes() {
        assert!(normalize_api_base("/api").is_err());
        assert!(normalize_api_base("ftp://files.icycon.io").is_err());
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("15").unwrap(), Duration::from_secs(15));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.timeout.is_none());
        assert_eq!(config.state_dir, PathBuf::from(".icycon"));
    }

    #[test]
    fn test_with_api_base() {
        let config = ClientConfig::with_api_base("http://localhost:9000/").unwrap();
        assert_eq!(config.api_base, "http://localhost:9000");
        assert!(ClientConfig::with_api_base("not a url").is_err());
    }
}

//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `BOOKSHOP_CATALOG_URL` - Catalog service base URL (default: `http://localhost:8000/`)
//! - `BOOKSHOP_SALES_URL` - User/sales service base URL (default: `http://localhost:5000/`)
//! - `BOOKSHOP_SESSION_FILE` - Session file path (default: `$HOME/.bookshop/session.json`)
//! - `BOOKSHOP_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: none)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_URL: &str = "http://localhost:8000/";
const DEFAULT_SALES_URL: &str = "http://localhost:5000/";
const SESSION_DIR: &str = ".bookshop";
const SESSION_FILE_NAME: &str = "session.json";
const FALLBACK_SESSION_FILE: &str = ".bookshop-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the catalog/product service
    pub catalog_url: Url,
    /// Base URL of the user/sales service
    pub sales_url: Url,
    /// Where the session key-value file lives
    pub session_file: PathBuf,
    /// Optional per-request timeout
    pub http_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let catalog_url = parse_base_url(
            "BOOKSHOP_CATALOG_URL",
            &lookup("BOOKSHOP_CATALOG_URL").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_owned()),
        )?;
        let sales_url = parse_base_url(
            "BOOKSHOP_SALES_URL",
            &lookup("BOOKSHOP_SALES_URL").unwrap_or_else(|| DEFAULT_SALES_URL.to_owned()),
        )?;

        let session_file = lookup("BOOKSHOP_SESSION_FILE")
            .filter(|path| !path.trim().is_empty())
            .map_or_else(|| default_session_file(lookup("HOME")), PathBuf::from);

        let http_timeout = lookup("BOOKSHOP_HTTP_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .map(Duration::from_secs)
                    .ok_or_else(|| {
                        ConfigError::InvalidEnvVar(
                            "BOOKSHOP_HTTP_TIMEOUT_SECS".to_string(),
                            format!("expected a positive number of seconds, got '{raw}'"),
                        )
                    })
            })
            .transpose()?;

        Ok(Self {
            catalog_url,
            sales_url,
            session_file,
            http_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a service base URL, requiring http(s) and a trailing slash so that
/// relative API paths join underneath any path prefix.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Session file under the user's home directory, or the working directory
/// when no home is known.
fn default_session_file(home: Option<String>) -> PathBuf {
    home.filter(|h| !h.is_empty()).map_or_else(
        || PathBuf::from(FALLBACK_SESSION_FILE),
        |h| PathBuf::from(h).join(SESSION_DIR).join(SESSION_FILE_NAME),
    )
}

//! Web configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FOODIEVENT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `FOODIEVENT_BASE_URL` - Public URL of the site; `https` turns on secure cookies
//!
//! ## Optional
//! - `FOODIEVENT_HOST` - Bind address (default: 127.0.0.1)
//! - `FOODIEVENT_PORT` - Listen port (default: 3000)
//! - `FOODIEVENT_UPLOAD_DIR` - Where event images are written (default: crates/web/static/img)
//! - `FOODIEVENT_MAX_UPLOAD_BYTES` - Largest accepted request body (default: 5 MiB)
//! - `FOODIEVENT_STATUS_REFRESH_SECS` - Background status pass interval, 0 disables (default: 60)
//! - `FOODIEVENT_UTC_OFFSET` - Offset used to read and show event times (default: +10:00)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use chrono::FixedOffset;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// FoodieVent web configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: Url,
    /// Directory event images are saved into
    pub upload_dir: PathBuf,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
    /// Interval of the background status pass; `None` when disabled
    pub status_refresh: Option<Duration>,
    /// Local time offset for event times
    pub utc_offset: FixedOffset,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FOODIEVENT_DATABASE_URL")?;
        let host = parse_env("FOODIEVENT_HOST", "127.0.0.1")?;
        let port = parse_env("FOODIEVENT_PORT", "3000")?;
        let base_url = Url::parse(&get_required_env("FOODIEVENT_BASE_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("FOODIEVENT_BASE_URL".to_string(), e.to_string())
        })?;
        let upload_dir = PathBuf::from(get_env_or_default(
            "FOODIEVENT_UPLOAD_DIR",
            "crates/web/static/img",
        ));
        let max_upload_bytes = parse_env(
            "FOODIEVENT_MAX_UPLOAD_BYTES",
            &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
        )?;
        let refresh_secs: u64 = parse_env("FOODIEVENT_STATUS_REFRESH_SECS", "60")?;
        let utc_offset = parse_utc_offset(&get_env_or_default("FOODIEVENT_UTC_OFFSET", "+10:00"))
            .map_err(|e| ConfigError::InvalidEnvVar("FOODIEVENT_UTC_OFFSET".to_string(), e))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            upload_dir,
            max_upload_bytes,
            status_refresh: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            utc_offset,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must carry the `Secure` flag.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` when neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse `+HH:MM` / `-HH:MM` into a fixed offset.
fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let value = value.trim();
    let (sign, rest) = match value.as_bytes().first() {
        Some(b'+') => (1, &value[1..]),
        Some(b'-') => (-1, &value[1..]),
        _ => return Err(format!("expected +HH:MM or -HH:MM, got {value:?}")),
    };
    let (hours, minutes) = rest
        .split_once(':')
        .ok_or_else(|| format!("expected +HH:MM or -HH:MM, got {value:?}"))?;
    let hours: i32 = hours.parse().map_err(|_| format!("invalid hours in {value:?}"))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| format!("invalid minutes in {value:?}"))?;
    if !(0..60).contains(&minutes) {
        return Err(format!("invalid minutes in {value:?}"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset out of range: {value:?}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> WebConfig {
        WebConfig {
            database_url: SecretString::from("postgres://localhost/foodievent"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse("http://localhost:3000").unwrap(),
            upload_dir: PathBuf::from("static/img"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            status_refresh: Some(Duration::from_secs(60)),
            utc_offset: FixedOffset::east_opt(36_000).unwrap(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_https() {
        let mut config = config();
        assert!(!config.is_https());
        config.base_url = Url::parse("https://foodievent.example").unwrap();
        assert!(config.is_https());
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(
            parse_utc_offset("+10:00").unwrap(),
            FixedOffset::east_opt(36_000).unwrap()
        );
        assert_eq!(
            parse_utc_offset("-03:30").unwrap(),
            FixedOffset::west_opt(12_600).unwrap()
        );
        assert!(parse_utc_offset("10:00").is_err());
        assert!(parse_utc_offset("+10").is_err());
        assert!(parse_utc_offset("+10:75").is_err());
        assert!(parse_utc_offset("+30:00").is_err());
    }

    #[test]
    fn test_database_url_debug_is_redacted() {
        let debug_output = format!("{:?}", config());
        assert!(!debug_output.contains("postgres://localhost/foodievent"));
    }
}

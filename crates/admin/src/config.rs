//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `REMOTE_STORE_URL` - Base URL of the hosted database/storage service
//! - `REMOTE_STORE_KEY` - API key for the remote store (high entropy)
//!
//! ## Optional
//! - `TREKBASE_HOST` - Bind address (default: 127.0.0.1)
//! - `TREKBASE_PORT` - Listen port (default: 3001)
//! - `TREKBASE_DATA_DIR` - Directory holding the local mirror file (default: ./data)
//! - `REMOTE_TRIPS_TABLE` - Remote table trips are migrated into (default: trips)
//! - `MIGRATION_DELAY_MS` - Pause between migrated records (default: 100)
//! - `MIGRATION_STRICT_SUCCESS` - Report failure if any record failed (default: false)
//! - `MIRROR_POLL_MS` - How often the mirror file is checked for writes by
//!   other processes (default: 1000)
//! - `ANALYTICS_MAX_EVENTS` - Analytics events kept in the mirror (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use trekbase_core::SuccessPolicy;

use crate::migration::MigrationOptions;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TRIPS_TABLE: &str = "trips";
/// File name of the local mirror inside the data directory.
pub const MIRROR_FILE_NAME: &str = "mirror.json";
const DEFAULT_DATA_DIR: &str = "./data";
/// Analytics events kept in the mirror unless configured otherwise.
pub const DEFAULT_MAX_ANALYTICS_EVENTS: usize = 1000;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the local mirror file
    pub data_dir: PathBuf,
    /// Remote store connection
    pub remote: RemoteStoreConfig,
    /// Migration tuning
    pub migration: MigrationConfig,
    /// Local mirror tuning
    pub mirror: MirrorConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Remote store connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct RemoteStoreConfig {
    /// Base URL, without a trailing slash
    pub url: String,
    /// API key sent as `apikey` and bearer token
    pub api_key: SecretString,
    /// Table trips are migrated into
    pub trips_table: String,
}

impl std::fmt::Debug for RemoteStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("trips_table", &self.trips_table)
            .finish()
    }
}

/// Migration tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationConfig {
    /// Pause between two migrated records
    pub delay: Duration,
    /// Fail the run when any record failed
    pub strict_success: bool,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            strict_success: false,
        }
    }
}

/// Local mirror tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Interval between checks of the mirror file for outside writes
    pub poll_interval: Duration,
    /// Analytics events kept before the oldest are dropped
    pub max_analytics_events: usize,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_analytics_events: DEFAULT_MAX_ANALYTICS_EVENTS,
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("TREKBASE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TREKBASE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("TREKBASE_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TREKBASE_PORT".to_string(), e.to_string()))?;
        let data_dir = data_dir_from_env();

        let remote = RemoteStoreConfig::from_env()?;
        let migration = MigrationConfig::from_env()?;
        let mirror = MirrorConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            data_dir,
            remote,
            migration,
            mirror,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the file backing the local mirror.
    #[must_use]
    pub fn mirror_path(&self) -> PathBuf {
        self.data_dir.join(MIRROR_FILE_NAME)
    }

    /// Options for the migration routine.
    #[must_use]
    pub fn migration_options(&self) -> MigrationOptions {
        MigrationOptions {
            table: self.remote.trips_table.clone(),
            delay: self.migration.delay,
            success_policy: if self.migration.strict_success {
                SuccessPolicy::NoErrors
            } else {
                SuccessPolicy::AnyMigrated
            },
        }
    }
}

impl RemoteStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = get_required_env("REMOTE_STORE_URL")?;
        let url = validate_base_url(&url, "REMOTE_STORE_URL")?;

        Ok(Self {
            url,
            api_key: get_validated_secret("REMOTE_STORE_KEY")?,
            trips_table: get_env_or_default("REMOTE_TRIPS_TABLE", DEFAULT_TRIPS_TABLE),
        })
    }
}

impl MigrationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let delay_ms = get_env_or_default("MIGRATION_DELAY_MS", "100")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MIGRATION_DELAY_MS".to_string(), e.to_string())
            })?;
        let strict_success = get_env_or_default("MIGRATION_STRICT_SUCCESS", "false")
            .parse::<bool>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("MIGRATION_STRICT_SUCCESS".to_string(), e.to_string())
            })?;

        Ok(Self {
            delay: Duration::from_millis(delay_ms),
            strict_success,
        })
    }
}

impl MirrorConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let poll_ms = get_env_or_default("MIRROR_POLL_MS", "1000")
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("MIRROR_POLL_MS".to_string(), e.to_string()))?;
        if poll_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MIRROR_POLL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let max_analytics_events = get_env_or_default(
            "ANALYTICS_MAX_EVENTS",
            &DEFAULT_MAX_ANALYTICS_EVENTS.to_string(),
        )
        .parse::<usize>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ANALYTICS_MAX_EVENTS".to_string(), e.to_string())
        })?;

        Ok(Self {
            poll_interval: Duration::from_millis(poll_ms),
            max_analytics_events,
        })
    }
}

/// Data directory from `TREKBASE_DATA_DIR`, for tools that only need the
/// local mirror and not the remote store.
#[must_use]
pub fn data_dir_from_env() -> PathBuf {
    PathBuf::from(get_env_or_default("TREKBASE_DATA_DIR", DEFAULT_DATA_DIR))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Check that a base URL parses as http(s) and strip any trailing slash.
fn validate_base_url(value: &str, var_name: &str) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the remote store."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> AdminConfig {
        AdminConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            data_dir: PathBuf::from("/var/lib/trekbase"),
            remote: RemoteStoreConfig {
                url: "https://db.trekbase.test".to_string(),
                api_key: SecretString::from("eyJhbGciOiJIUzI1NiJ9.k3y"),
                trips_table: DEFAULT_TRIPS_TABLE.to_string(),
            },
            migration: MigrationConfig::default(),
            mirror: MirrorConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-anon-key-here", "TEST_VAR");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_changeme() {
        assert!(validate_secret_strength("changeme123", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_base_url_trims_trailing_slash() {
        let url = validate_base_url("https://db.trekbase.test/", "TEST_URL").unwrap();
        assert_eq!(url, "https://db.trekbase.test");
    }

    #[test]
    fn test_validate_base_url_rejects_other_schemes() {
        assert!(validate_base_url("ftp://db.trekbase.test", "TEST_URL").is_err());
        assert!(validate_base_url("not a url", "TEST_URL").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_mirror_path_lives_in_data_dir() {
        assert_eq!(
            test_config().mirror_path(),
            PathBuf::from("/var/lib/trekbase/mirror.json")
        );
    }

    #[test]
    fn test_migration_options_follow_strict_flag() {
        let mut config = test_config();
        let options = config.migration_options();
        assert_eq!(options.table, "trips");
        assert_eq!(options.delay, Duration::from_millis(100));
        assert_eq!(options.success_policy, SuccessPolicy::AnyMigrated);

        config.migration.strict_success = true;
        assert_eq!(
            config.migration_options().success_policy,
            SuccessPolicy::NoErrors
        );
    }

    #[test]
    fn test_mirror_defaults() {
        let mirror = test_config().mirror;
        assert_eq!(mirror.poll_interval, Duration::from_secs(1));
        assert_eq!(mirror.max_analytics_events, DEFAULT_MAX_ANALYTICS_EVENTS);
    }

    #[test]
    fn test_remote_store_config_debug_redacts_key() {
        let config = RemoteStoreConfig {
            url: "https://db.trekbase.test".to_string(),
            api_key: SecretString::from("super_hidden_remote_key"),
            trips_table: "trips".to_string(),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("db.trekbase.test"));
        assert!(debug_output.contains("trips"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_hidden_remote_key"));
    }
}

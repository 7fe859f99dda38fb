//! Ingest configuration
//!
//! Loaded from environment variables with documented defaults, the same way
//! the rest of the system configures itself. `.env` files are honored for
//! local development.

use serde::{Deserialize, Serialize};

// ============================================================================
// Ingest Configuration Constants
// ============================================================================

/// Default provider base URL for local development.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "http://127.0.0.1:9100";

/// Default provider request timeout in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Default SQLite database URL.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://pulse.db";

/// Default staging directory.
pub const DEFAULT_STAGING_DIR: &str = "./data/staging";

/// Default completed directory.
pub const DEFAULT_COMPLETED_DIR: &str = "./data/completed";

/// Default fetch lookback window in minutes.
pub const DEFAULT_LOOKBACK_MINUTES: i64 = 60;

/// Default interval between fetch runs in seconds.
pub const DEFAULT_FETCH_INTERVAL_SECS: u64 = 900;

/// Default number of scalar rows committed per store batch.
pub const DEFAULT_STORE_BATCH_SIZE: usize = 100;

/// Provider connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            api_token: None,
            request_timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

/// Ingest pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub provider: ProviderConfig,
    pub database_url: String,
    pub staging_dir: String,
    pub completed_dir: String,
    pub lookback_minutes: i64,
    pub fetch_interval_secs: u64,
    pub store_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            staging_dir: DEFAULT_STAGING_DIR.to_string(),
            completed_dir: DEFAULT_COMPLETED_DIR.to_string(),
            lookback_minutes: DEFAULT_LOOKBACK_MINUTES,
            fetch_interval_secs: DEFAULT_FETCH_INTERVAL_SECS,
            store_batch_size: DEFAULT_STORE_BATCH_SIZE,
        }
    }
}

impl IngestConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = IngestConfig {
            provider: ProviderConfig {
                base_url: std::env::var("PULSE_PROVIDER_URL")
                    .unwrap_or_else(|_| DEFAULT_PROVIDER_BASE_URL.to_string()),
                api_token: std::env::var("PULSE_PROVIDER_TOKEN").ok(),
                request_timeout_secs: env_parsed(
                    "PULSE_PROVIDER_TIMEOUT",
                    DEFAULT_PROVIDER_TIMEOUT_SECS,
                ),
            },
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            staging_dir: std::env::var("PULSE_STAGING_DIR")
                .unwrap_or_else(|_| DEFAULT_STAGING_DIR.to_string()),
            completed_dir: std::env::var("PULSE_COMPLETED_DIR")
                .unwrap_or_else(|_| DEFAULT_COMPLETED_DIR.to_string()),
            lookback_minutes: env_parsed("PULSE_LOOKBACK_MINUTES", DEFAULT_LOOKBACK_MINUTES),
            fetch_interval_secs: env_parsed(
                "PULSE_FETCH_INTERVAL",
                DEFAULT_FETCH_INTERVAL_SECS,
            ),
            store_batch_size: env_parsed("PULSE_STORE_BATCH_SIZE", DEFAULT_STORE_BATCH_SIZE),
        };

        if config.lookback_minutes <= 0 {
            anyhow::bail!(
                "PULSE_LOOKBACK_MINUTES must be positive, got {}",
                config.lookback_minutes
            );
        }

        Ok(config)
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = IngestConfig::default();
        assert_eq!(config.lookback_minutes, DEFAULT_LOOKBACK_MINUTES);
        assert_eq!(config.store_batch_size, DEFAULT_STORE_BATCH_SIZE);
        assert!(config.provider.api_token.is_none());
    }

    #[test]
    fn test_env_parsed_falls_back_on_garbage() {
        // Unset variable falls back
        assert_eq!(env_parsed::<u64>("PULSE_TEST_UNSET_VAR", 7), 7);
    }
}

//! Store configuration
//!
//! Settings are read from `TALKS_`-prefixed environment variables layered
//! over built-in defaults, e.g. `TALKS_DATABASE_URL` or `TALKS_LOG_FORMAT`.

use serde::{Deserialize, Serialize};

/// Connection string used when `TALKS_DATABASE_URL` is unset
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/talks";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Runtime configuration for the talk store and its tooling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalksConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
    /// Seconds before a pooled connection is recycled
    pub max_lifetime_secs: u64,
    /// Seconds an idle connection is kept open
    pub idle_timeout_secs: u64,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for TalksConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 30,
            max_lifetime_secs: 30 * 60,
            idle_timeout_secs: 10 * 60,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl TalksConfig {
    /// Loads configuration from the environment over the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::Environment::with_prefix("TALKS"))
            .build()?
            .try_deserialize()
    }
}

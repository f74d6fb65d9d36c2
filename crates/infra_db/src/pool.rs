//! Connection pool for the talk store
//!
//! [`DatabaseConfig`] collects the pool knobs, usually from [`TalksConfig`],
//! and [`create_pool`] turns them into a live SQLx pool.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::{TalksConfig, DEFAULT_DATABASE_URL};
use crate::error::DatabaseError;

pub type DatabasePool = PgPool;

/// Pool settings
///
/// ```rust
/// use std::time::Duration;
/// use infra_db::DatabaseConfig;
///
/// let config = DatabaseConfig::new("postgres://localhost/talks")
///     .max_connections(20)
///     .idle_timeout(Duration::from_secs(60));
/// assert_eq!(config.min_connections, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long to wait for a pooled connection
    pub acquire_timeout: Duration,
    /// Connections older than this are closed when returned
    pub max_lifetime: Duration,
    /// Idle connections above `min_connections` are closed after this
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self::from(&TalksConfig {
            database_url: url.into(),
            ..TalksConfig::default()
        })
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_URL)
    }
}

impl From<&TalksConfig> for DatabaseConfig {
    fn from(config: &TalksConfig) -> Self {
        Self {
            url: config.database_url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
            max_lifetime: Duration::from_secs(config.max_lifetime_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }
}

/// Connects a pool with the given settings
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if the database is unreachable
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Database pool created");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = DatabaseConfig::new("postgres://test")
            .max_connections(50)
            .min_connections(10)
            .acquire_timeout(Duration::from_secs(60))
            .max_lifetime(Duration::from_secs(120))
            .idle_timeout(Duration::from_secs(15));

        assert_eq!(config.url, "postgres://test");
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.min_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(60));
        assert_eq!(config.max_lifetime, Duration::from_secs(120));
        assert_eq!(config.idle_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_settings_drive_every_pool_knob() {
        let settings = TalksConfig {
            database_url: "postgres://db/talks".to_string(),
            max_connections: 4,
            min_connections: 1,
            acquire_timeout_secs: 5,
            max_lifetime_secs: 90,
            idle_timeout_secs: 30,
            ..TalksConfig::default()
        };
        let config = DatabaseConfig::from(&settings);

        assert_eq!(config.url, "postgres://db/talks");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
        assert_eq!(config.max_lifetime, Duration::from_secs(90));
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_default_uses_local_database() {
        let config = DatabaseConfig::default();
        assert_eq!(config.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.max_lifetime, Duration::from_secs(30 * 60));
        assert_eq!(config.idle_timeout, Duration::from_secs(10 * 60));
    }
}

//! Database configuration.

use std::env;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Reads `DATABASE_URL`, `DB_MAX_CONNECTIONS` (20), `DB_MIN_CONNECTIONS` (2),
    /// `DB_CONNECTION_TIMEOUT_SECS` (5), `DB_IDLE_TIMEOUT_SECS` (600) and
    /// `DB_MAX_LIFETIME_SECS` (1800). Unset or unparsable values fall back to
    /// the defaults in parentheses; a missing `DATABASE_URL` falls back to the
    /// development database.
    pub fn from_env() -> Self {
        let dev = Self::development();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(dev.database_url),
            max_connections: env_or("DB_MAX_CONNECTIONS", dev.max_connections),
            min_connections: env_or("DB_MIN_CONNECTIONS", dev.min_connections),
            connection_timeout_secs: env_or(
                "DB_CONNECTION_TIMEOUT_SECS",
                dev.connection_timeout_secs,
            ),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", dev.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", dev.max_lifetime_secs),
        }
    }

    /// Default configuration for local development
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/cafe_db".to_string(),
            max_connections: 20,
            min_connections: 2,
            connection_timeout_secs: 5,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert!(config.min_connections <= config.max_connections);
        assert!(config.database_url.starts_with("postgres://"));
    }
}

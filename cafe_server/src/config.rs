//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use cafe_core::{auth::tokens::MIN_SECRET_LEN, db::DatabaseConfig};
use std::net::{Ipv4Addr, SocketAddr};

/// Default HTTP bind address
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Seconds between background status sweeps; 0 disables the task
    pub status_sweep_interval_secs: u64,
    /// Prometheus scrape address; no exporter when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            bind_override,
            database_url_override,
        )
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(
        lookup: F,
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_optional(&lookup, "SERVER_BIND")?.unwrap_or(DEFAULT_BIND),
        };

        let dev = DatabaseConfig::development();
        let database = DatabaseConfig {
            database_url: database_url_override
                .or_else(|| lookup("DATABASE_URL"))
                .unwrap_or(dev.database_url),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", dev.max_connections)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", dev.min_connections)?,
            connection_timeout_secs: parse_or(
                &lookup,
                "DB_CONNECTION_TIMEOUT_SECS",
                dev.connection_timeout_secs,
            )?,
            idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", dev.idle_timeout_secs)?,
            max_lifetime_secs: parse_or(&lookup, "DB_MAX_LIFETIME_SECS", dev.max_lifetime_secs)?,
        };

        let jwt_secret = lookup("JWT_SECRET").ok_or_else(|| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -hex 32".to_string(),
        })?;

        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: format!("Must be at least {MIN_SECRET_LEN} characters"),
            });
        }

        Ok(ServerConfig {
            bind,
            database,
            jwt_secret,
            status_sweep_interval_secs: parse_or(&lookup, "STATUS_SWEEP_INTERVAL_SECS", 0)?,
            metrics_bind: parse_optional(&lookup, "METRICS_BIND")?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        if self.database.connection_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_CONNECTION_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse a variable, falling back to `default` when unset
///
/// A set but unparsable value is an error rather than a silent default.
fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                var: key.to_string(),
                reason: format!("Cannot parse '{raw}'"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned(), None, None)
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.database, DatabaseConfig::development());
        assert_eq!(config.status_sweep_interval_secs, 0);
        assert_eq!(config.metrics_bind, None);
        assert!(config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_secret() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref var, .. } if var == "JWT_SECRET"));
        assert!(err.to_string().contains("openssl"));
    }

    #[test]
    fn test_short_secret() {
        let err = load(&[("JWT_SECRET", "tiny")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "JWT_SECRET"));
    }

    #[test]
    fn test_unparsable_value_is_rejected() {
        let err = load(&[("JWT_SECRET", SECRET), ("STATUS_SWEEP_INTERVAL_SECS", "soon")])
            .unwrap_err();
        assert!(err.to_string().contains("STATUS_SWEEP_INTERVAL_SECS"));
    }

    #[test]
    fn test_overrides_win() {
        let bind: SocketAddr = "0.0.0.0:8088".parse().unwrap();
        let config = ServerConfig::from_lookup(
            |key| match key {
                "JWT_SECRET" => Some(SECRET.to_string()),
                "SERVER_BIND" => Some("127.0.0.1:1".to_string()),
                "DATABASE_URL" => Some("postgres://env/db".to_string()),
                "METRICS_BIND" => Some("127.0.0.1:9090".to_string()),
                "RUN_MIGRATIONS" => Some("false".to_string()),
                _ => None,
            },
            Some(bind),
            Some("postgres://cli/db".to_string()),
        )
        .unwrap();

        assert_eq!(config.bind, bind);
        assert_eq!(config.database.database_url, "postgres://cli/db");
        assert_eq!(config.metrics_bind, Some("127.0.0.1:9090".parse().unwrap()));
        assert!(!config.run_migrations);
    }

    #[test]
    fn test_pool_bounds_validation() {
        let mut config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        config.database.min_connections = config.database.max_connections + 1;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));

        let mut config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metrics_bind_must_differ() {
        let mut config = load(&[("JWT_SECRET", SECRET)]).unwrap();
        config.metrics_bind = Some(config.bind);
        assert!(config.validate().is_err());
    }
}

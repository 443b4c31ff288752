//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;

use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Longest accepted auth session lifetime (one year).
pub const MAX_AUTH_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Credentials of the administrator created on first start.
#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub database_max_connections: u32,
    pub auth_session_ttl_hours: i64,
    /// `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Server and Database Settings ---
        let bind_address = parse_or::<SocketAddr, _>(&var, "BIND_ADDRESS", "0.0.0.0:8080")?;

        let database_url =
            var("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let database_max_connections = parse_or::<u32, _>(&var, "DATABASE_MAX_CONNECTIONS", "5")?;
        if database_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        // --- Auth Settings ---
        let auth_session_ttl_hours = parse_or::<i64, _>(&var, "AUTH_SESSION_TTL_HOURS", "24")?;
        if !(1..=MAX_AUTH_SESSION_TTL_HOURS).contains(&auth_session_ttl_hours) {
            return Err(ConfigError::InvalidValue(
                "AUTH_SESSION_TTL_HOURS".to_string(),
                format!("must be between 1 and {} hours", MAX_AUTH_SESSION_TTL_HOURS),
            ));
        }

        let bootstrap_admin = match (var("BOOTSTRAP_ADMIN_USERNAME"), var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingVar("BOOTSTRAP_ADMIN_PASSWORD".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingVar("BOOTSTRAP_ADMIN_USERNAME".to_string()))
            }
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            database_max_connections,
            auth_session_ttl_hours,
            cors_allowed_origin: var("CORS_ALLOWED_ORIGIN"),
            bootstrap_admin,
        })
    }
}

/// Parses `key` when set, otherwise parses `default`.
fn parse_or<T, V>(var: &V, key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    let raw = var(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/directory")]).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.auth_session_ttl_hours, 24);
        assert!(config.cors_allowed_origin.is_none());
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn database_url_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(key) if key == "DATABASE_URL"));
    }

    #[test]
    fn malformed_values_name_the_offending_key() {
        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/directory"),
            ("BIND_ADDRESS", "not-an-address"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key, _) if key == "BIND_ADDRESS"));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/directory"),
            ("RUST_LOG", "chatty"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key, _) if key == "RUST_LOG"));

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/directory"),
            ("AUTH_SESSION_TTL_HOURS", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key, _) if key == "AUTH_SESSION_TTL_HOURS"));
    }

    #[test]
    fn session_ttl_is_capped_at_one_year() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/directory"),
            ("AUTH_SESSION_TTL_HOURS", "8760"),
        ])
        .unwrap();
        assert_eq!(config.auth_session_ttl_hours, MAX_AUTH_SESSION_TTL_HOURS);

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/directory"),
            ("AUTH_SESSION_TTL_HOURS", "10000000000000"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key, _) if key == "AUTH_SESSION_TTL_HOURS"));
    }

    #[test]
    fn bootstrap_admin_needs_both_halves() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/directory"),
            ("BOOTSTRAP_ADMIN_USERNAME", "admin"),
            ("BOOTSTRAP_ADMIN_PASSWORD", "s3cret"),
        ])
        .unwrap();
        assert_eq!(config.bootstrap_admin.unwrap().username, "admin");

        let err = load(&[
            ("DATABASE_URL", "postgres://localhost/directory"),
            ("BOOTSTRAP_ADMIN_USERNAME", "admin"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(key) if key == "BOOTSTRAP_ADMIN_PASSWORD"));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/directory"),
            ("BIND_ADDRESS", "127.0.0.1:9000"),
            ("RUST_LOG", "debug"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("CORS_ALLOWED_ORIGIN", "https://pharmacies.example"),
        ])
        .unwrap();

        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.cors_allowed_origin.as_deref(), Some("https://pharmacies.example"));
    }
}

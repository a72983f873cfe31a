//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{net::SocketAddr, path::PathBuf, time::Duration};
use vpoker::TableConfig;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Settings for new tables and push streams
    pub table: TableConfig,
    /// Prometheus exporter address, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
}

/// Where and how often state is saved
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// State file location
    pub path: PathBuf,
    /// Seconds between periodic saves
    pub save_interval_secs: u64,
}

impl PersistenceConfig {
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.save_interval_secs)
    }
}

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_STATE_PATH: &str = "/tmp/vpoker.json";

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `state_path_override` - Optional state file override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        state_path_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_env_required_or("SERVER_BIND", DEFAULT_BIND)?,
        };

        let path = state_path_override
            .or_else(|| std::env::var("STATE_PATH").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_PATH));
        let persistence = PersistenceConfig {
            path,
            save_interval_secs: parse_env_or("SAVE_INTERVAL_SECS", 10),
        };

        let defaults = TableConfig::default();
        let table = TableConfig {
            max_seats: parse_env_or("TABLE_MAX_SEATS", defaults.max_seats),
            chips_per_stack: parse_env_or("TABLE_CHIPS_PER_STACK", defaults.chips_per_stack),
            push_buffer: parse_env_or("PUSH_BUFFER", defaults.push_buffer),
            keepalive_secs: parse_env_or("KEEPALIVE_SECS", defaults.keepalive_secs),
        };

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(value) => Some(value.parse().map_err(|_| ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("'{}' is not an IP:PORT address", value),
            })?),
            Err(_) => None,
        };

        Ok(ServerConfig {
            bind,
            persistence,
            table,
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.persistence.save_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SAVE_INTERVAL_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.table
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "TABLE_*".to_string(),
                reason,
            })?;

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from SERVER_BIND ({})", self.bind),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like [`parse_env_or`], but a set and unparsable value is an error.
fn parse_env_required_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|_| ConfigError::Invalid {
        var: key.to_string(),
        reason: format!("'{}' cannot be parsed", value),
    })
}

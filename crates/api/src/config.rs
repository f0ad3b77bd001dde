//! Server configuration
//!
//! Defaults reproduce the fixed deployment (port 8080, `./servr.db`,
//! `./certs/app.{crt,key}`). They can be overridden from an optional
//! `chameleon.toml` in the working directory and from `CHAMELEON_*`
//! environment variables, in that order of precedence.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ServerError;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chameleon.toml";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "CHAMELEON";

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Path prefix all endpoints are mounted under
    pub api_prefix: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// PEM certificate chain
    pub cert_path: PathBuf,
    /// PEM private key
    pub key_path: PathBuf,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Max tracing level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Prometheus exporter listen address; disabled when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_prefix: "/api/v1".to_string(),
            database_path: PathBuf::from("./servr.db"),
            cert_path: PathBuf::from("./certs/app.crt"),
            key_path: PathBuf::from("./certs/app.key"),
            read_timeout_secs: 5,
            write_timeout_secs: 10,
            idle_timeout_secs: 120,
            log_level: "info".to_string(),
            log_json: false,
            metrics_addr: None,
        }
    }
}

impl AppConfig {
    /// Load from `chameleon.toml` (if present) and the environment
    pub fn load() -> Result<Self, ServerError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load from the given file (if present) and the environment
    pub fn load_from(path: &Path) -> Result<Self, ServerError> {
        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialization alone cannot catch
    pub fn validate(&self) -> Result<(), ServerError> {
        self.host
            .parse::<IpAddr>()
            .map_err(|e| ServerError::InvalidConfig(format!("host {:?}: {}", self.host, e)))?;

        let prefix = &self.api_prefix;
        if !prefix.starts_with('/') || prefix.ends_with('/') {
            return Err(ServerError::InvalidConfig(format!(
                "api_prefix {prefix:?} must start with '/' and must not end with '/'"
            )));
        }

        if self.read_timeout_secs == 0 || self.write_timeout_secs == 0 || self.idle_timeout_secs == 0 {
            return Err(ServerError::InvalidConfig(
                "timeouts must be at least one second".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address to listen on
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|e| ServerError::InvalidConfig(format!("host {:?}: {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

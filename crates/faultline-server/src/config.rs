//! Configuration for the collection service.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{AuditError, AuditResult};

/// Top-level configuration for the collection service.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ServerConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub http: HttpConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Audit behaviour configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ServerConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `faultline.toml` in the current directory (if present)
    /// 3. Environment variables with `FAULTLINE_SERVER_` prefix
    pub fn load() -> AuditResult<Self> {
        Figment::new()
            .merge(Toml::file("faultline.toml"))
            .merge(Env::prefixed("FAULTLINE_SERVER_").split("__"))
            .extract()
            .map_err(|e| AuditError::Config(e.to_string()))
    }

    /// Load configuration from a specific TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> AuditResult<Self> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("FAULTLINE_SERVER_").split("__"))
            .extract()
            .map_err(|e| AuditError::Config(e.to_string()))
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8085)
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_database_url() -> String {
    "postgres://localhost/faultline".to_owned()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Audit behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Deployment tier stamped on server-captured records.
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_environment() -> String {
    "production".to_owned()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ServerConfig::default();
        assert_eq!(config.http.listen_addr.port(), 8085);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.audit.environment, "production");
    }

    #[test]
    fn config_from_toml() {
        let toml = r#"
            [http]
            listen_addr = "127.0.0.1:9000"

            [database]
            url = "postgres://user:pass@db:5432/errors"
            max_connections = 20

            [audit]
            environment = "staging"
        "#;

        let config: ServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.http.listen_addr.port(), 9000);
        assert_eq!(config.database.url, "postgres://user:pass@db:5432/errors");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.audit.environment, "staging");
    }
}

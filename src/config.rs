//! Process configuration read from the environment.

use crate::db::{pool::DEFAULT_MAX_CONNECTIONS, DEFAULT_DB_FILE};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file (`DATABASE_PATH`).
    pub database_path: PathBuf,
    /// Interface to listen on (`BIND_ADDR`).
    pub bind_addr: IpAddr,
    /// HTTP port (`PORT`).
    pub port: u16,
    /// Pooled database connections (`DB_MAX_CONNECTIONS`).
    pub db_max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_FILE),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build configuration from a variable map; unset or blank values use defaults.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_path = get("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let bind_addr = match get("BIND_ADDR") {
            Some(value) => value.parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                expected: "an IP address",
                value,
            })?,
            None => defaults.bind_addr,
        };

        let port = match get("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a valid port number",
                value,
            })?,
            None => defaults.port,
        };

        let db_max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(value) => match value.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "DB_MAX_CONNECTIONS",
                        expected: "a positive integer",
                        value,
                    })
                }
            },
            None => defaults.db_max_connections,
        };

        Ok(Self {
            database_path,
            bind_addr,
            port,
            db_max_connections,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

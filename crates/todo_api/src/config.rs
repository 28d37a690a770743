//! Server configuration read from environment variables.
//!
//! # Responsibility
//! - Resolve listen address, backing store location and logging options.
//! - Report malformed values before the server starts.
//!
//! # Invariants
//! - `DATABASE_URL` wins over the discrete `DB_DIR` / `DB_NAME` fields.
//! - The server takes no runtime flags; the environment is the only input.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_DB_DIR: &str = ".";
const DEFAULT_DB_NAME: &str = "todo";
const DB_FILE_EXTENSION: &str = "sqlite3";

/// Where the backing table lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl DatabaseLocation {
    /// Parses a connection string: `sqlite::memory:`, `:memory:`,
    /// `sqlite://<path>`, `sqlite:<path>` or a bare path.
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_URL",
                value: url.to_string(),
                reason: "must not be empty",
            });
        }

        let path = trimmed
            .strip_prefix("sqlite://")
            .or_else(|| trimmed.strip_prefix("sqlite:"))
            .unwrap_or(trimmed);

        match path {
            ":memory:" => Ok(Self::Memory),
            "" => Err(ConfigError::InvalidValue {
                key: "DATABASE_URL",
                value: url.to_string(),
                reason: "missing database path",
            }),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Memory => "memory".to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub host: String,
    pub port: u16,
    pub database: DatabaseLocation,
    pub log_level: String,
    /// Absolute directory for rotated log files; stderr when unset.
    pub log_dir: Option<String>,
}

impl Configuration {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value,
                reason: "must be a valid port",
            })?,
            None => DEFAULT_PORT,
        };

        let database = match get("DATABASE_URL") {
            Some(url) => DatabaseLocation::parse(&url)?,
            None => {
                let dir = get("DB_DIR").unwrap_or_else(|| DEFAULT_DB_DIR.to_string());
                let name = get("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
                DatabaseLocation::File(
                    PathBuf::from(dir).join(format!("{name}.{DB_FILE_EXTENSION}")),
                )
            }
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database,
            log_level: get("LOG_LEVEL")
                .unwrap_or_else(|| todo_core::default_log_level().to_string()),
            log_dir: get("LOG_DIR"),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key} `{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

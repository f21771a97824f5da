// ABOUTME: Runtime settings loaded from the environment
// ABOUTME: Database location, pool sizing, write retries, and listing page size

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    DOCKET_DATABASE_PATH, DOCKET_DB_ACQUIRE_TIMEOUT_SECS, DOCKET_DB_MAX_CONNECTIONS,
    DOCKET_DEFAULT_PAGE_SIZE, DOCKET_HOME, DOCKET_WRITE_RETRIES, HOME,
};

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_WRITE_RETRIES: u32 = 3;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid number for {key}: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("{key} = {value} is out of range ({min}-{max})")]
    OutOfRange {
        key: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

/// Get the Docket data directory (`$DOCKET_HOME`, else `~/.docket`)
pub fn docket_dir() -> PathBuf {
    docket_dir_from(|key| env::var(key).ok())
}

fn docket_dir_from<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(home) = lookup(DOCKET_HOME) {
        return PathBuf::from(home);
    }
    // HOME first so tests can redirect it
    if let Some(home) = lookup(HOME) {
        return PathBuf::from(home).join(".docket");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".docket")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Extra attempts after a version conflict when attaching items
    pub write_retries: u32,
    pub default_page_size: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: docket_dir().join("docket.db"),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            write_retries: DEFAULT_WRITE_RETRIES,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup(DOCKET_DATABASE_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| docket_dir_from(&lookup).join("docket.db"));

        let max_connections = parse_bounded(
            &lookup,
            DOCKET_DB_MAX_CONNECTIONS,
            DEFAULT_MAX_CONNECTIONS as i64,
            1,
            100,
        )? as u32;

        let acquire_timeout_secs = parse_bounded(
            &lookup,
            DOCKET_DB_ACQUIRE_TIMEOUT_SECS,
            DEFAULT_ACQUIRE_TIMEOUT_SECS as i64,
            1,
            3600,
        )? as u64;

        let write_retries = parse_bounded(
            &lookup,
            DOCKET_WRITE_RETRIES,
            DEFAULT_WRITE_RETRIES as i64,
            0,
            10,
        )? as u32;

        let default_page_size =
            parse_bounded(&lookup, DOCKET_DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE, 1, 100)?;

        let config = Config {
            database_path,
            max_connections,
            acquire_timeout_secs,
            write_retries,
            default_page_size,
        };

        debug!("Loaded configuration: {:?}", config);

        Ok(config)
    }
}

fn parse_bounded<F>(
    lookup: &F,
    key: &'static str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|source| ConfigError::InvalidNumber { key, source })?,
        None => return Ok(default),
    };

    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            key,
            value,
            min,
            max,
        });
    }

    Ok(value)
}

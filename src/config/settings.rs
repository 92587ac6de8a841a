//! Process settings from environment variables (a `.env` file is honored by the binary).

use crate::error::ConfigError;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// PostgreSQL schema holding one table per collection.
    pub store_schema: String,
    /// Deployment-specific prefix for physical collection names.
    pub collection_prefix: String,
    pub bind_addr: String,
    /// Directory containing `collections.json`; built-in collections when unset.
    pub config_path: Option<PathBuf>,
    pub max_body_bytes: usize,
    pub max_connections: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Settings {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/collections".into()),
            store_schema: lookup("STORE_SCHEMA").unwrap_or_else(|| "documents".into()),
            collection_prefix: lookup("COLLECTION_PREFIX").unwrap_or_default(),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into()),
            config_path: lookup("CONFIG_PATH")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES", 1024 * 1024)?,
            max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ConfigError::Validation(format!("{}: {}", name, e))),
    }
}

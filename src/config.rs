//! Runtime configuration read from the environment (`.env` is loaded first by `main`).

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Prefix for hyperlinks rendered into responses, without a trailing slash.
    pub public_base_url: String,
    pub nats_url: Option<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value: raw })?,
            None => 8000,
        };
        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name: "DATABASE_MAX_CONNECTIONS", value: raw })?,
            None => 10,
        };
        let backend = match var("STORE_BACKEND").as_deref() {
            None | Some("postgres") => Backend::Postgres,
            Some("memory") => Backend::Memory,
            Some(other) => return Err(ConfigError::Invalid { name: "STORE_BACKEND", value: other.to_string() }),
        };
        let database_url = var("DATABASE_URL");
        if backend == Backend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let public_base_url = var("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Ok(Self { port, backend, database_url, max_connections, public_base_url, nats_url: var("NATS_URL") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_database() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/store")])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.backend, Backend::Postgres);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.public_base_url, "http://localhost:8000");
        assert_eq!(config.nats_url, None);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert_eq!(Config::from_lookup(lookup(&[])), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_memory_backend_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("PORT", "9090"),
            ("PUBLIC_BASE_URL", "https://shop.example.com/"),
        ]))
        .unwrap();
        assert_eq!(config.backend, Backend::Memory);
        assert_eq!(config.port, 9090);
        assert_eq!(config.public_base_url, "https://shop.example.com");
    }

    #[test]
    fn test_invalid_values() {
        let err = Config::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { name: "PORT", value: "eighty".into() });
        let err = Config::from_lookup(lookup(&[("STORE_BACKEND", "redis")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "STORE_BACKEND", .. }));
    }
}

//! Runtime settings from the environment, and tracing setup.

use crate::error::ConfigError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_API_PREFIX: &str = "/api/v1";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug)]
pub struct Settings {
    /// `DATABASE_URL`: relational backend, `postgres://...` or `sqlite:...`.
    pub database_url: String,
    /// `DOCUMENT_PATH`: sled directory; a temporary store when unset.
    pub document_path: Option<PathBuf>,
    /// `BIND_ADDR`
    pub bind_addr: String,
    /// `API_PREFIX`: mount point of the resource routes.
    pub api_prefix: String,
    /// `BODY_LIMIT`: request body limit in bytes.
    pub body_limit: usize,
    /// `DEFAULT_PAGE_SIZE`: listing size when a request has none.
    pub default_page_size: u64,
    /// `MAX_CONNECTIONS`: relational pool size.
    pub max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            document_path: None,
            bind_addr: DEFAULT_BIND_ADDR.into(),
            api_prefix: DEFAULT_API_PREFIX.into(),
            body_limit: crate::routes::DEFAULT_BODY_LIMIT,
            default_page_size: crate::domain::PageRequest::DEFAULT_SIZE,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("expected a non-negative integer, got '{}'", raw),
    })
}

impl Settings {
    /// Reads every setting through `lookup`; unset or blank keys keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();
        if let Some(v) = get("DATABASE_URL") {
            settings.database_url = v;
        }
        settings.document_path = get("DOCUMENT_PATH").map(PathBuf::from);
        if let Some(v) = get("BIND_ADDR") {
            settings.bind_addr = v;
        }
        if let Some(v) = get("API_PREFIX") {
            settings.api_prefix = v;
        }
        if let Some(v) = get("BODY_LIMIT") {
            settings.body_limit = parse_number("BODY_LIMIT", &v)?;
        }
        if let Some(v) = get("DEFAULT_PAGE_SIZE") {
            settings.default_page_size = parse_number("DEFAULT_PAGE_SIZE", &v)?;
            if settings.default_page_size == 0 {
                return Err(ConfigError::Invalid {
                    key: "DEFAULT_PAGE_SIZE",
                    reason: "must be greater than 0".into(),
                });
            }
        }
        if let Some(v) = get("MAX_CONNECTIONS") {
            settings.max_connections = parse_number("MAX_CONNECTIONS", &v)?;
        }
        Ok(settings)
    }

    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Pool size to use: an in-memory SQLite database exists on one connection only.
    pub fn pool_size(&self) -> u32 {
        if self.database_url.starts_with("sqlite") && self.database_url.contains(":memory:") {
            1
        } else {
            self.max_connections.max(1)
        }
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` wins; `default_directive`
/// (e.g. `crud_sdk=info`) applies on top of it.
pub fn init_tracing(default_directive: &str) {
    let filter = match default_directive.parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

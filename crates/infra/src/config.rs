//! Database configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use thiserror::Error;

/// Configuration error (missing or malformed variable).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Connection settings for the Postgres store.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub connect_options: PgConnectOptions,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Read from the process environment (see [`DatabaseConfig::from_lookup`]).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from a variable lookup.
    ///
    /// `DATABASE_URL` wins when set. Otherwise the connection is described by
    /// `DB_HOST`, `DB_PORT` (default 5432), `DB_USER`, `DB_PASSWORD` and
    /// `DB_NAME`, passed as separate fields so no value needs URL escaping.
    /// `DB_MAX_CONNECTIONS` sizes the pool.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let connect_options = match lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => PgConnectOptions::from_str(&url).map_err(|_| ConfigError::Invalid {
                key: "DATABASE_URL",
                value: url,
            })?,
            None => {
                let host = lookup("DB_HOST").ok_or(ConfigError::Missing("DB_HOST"))?;
                let port = match lookup("DB_PORT") {
                    Some(p) => p.parse::<u16>().map_err(|_| ConfigError::Invalid {
                        key: "DB_PORT",
                        value: p,
                    })?,
                    None => 5432,
                };
                let user = lookup("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?;
                let name = lookup("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?;

                let options = PgConnectOptions::new()
                    .host(&host)
                    .port(port)
                    .username(&user)
                    .database(&name);
                match lookup("DB_PASSWORD").filter(|v| !v.is_empty()) {
                    Some(password) => options.password(&password),
                    None => options,
                }
            }
        };

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DB_MAX_CONNECTIONS",
                        value: v,
                    });
                }
            },
            None => Self::DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            connect_options,
            max_connections,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        })
    }

    /// Open a connection pool with these settings.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(self.connect_options.clone())
            .await
    }
}

//! Process configuration, read once from the environment at startup.

use std::net::{Ipv4Addr, SocketAddr};

use axum::http::HeaderValue;

use creditline_infra::{ConfigError, DatabaseConfig};

#[derive(Debug, Clone)]
pub struct Config {
    /// `PORT`, default 3000.
    pub port: u16,
    /// `SERVER_ID`, echoed as `X-Server-ID` on every response.
    pub server_id: Option<HeaderValue>,
    /// `USE_PERSISTENT_STORES`: Postgres when true, in-process memory otherwise.
    pub use_persistent_stores: bool,
    /// Required when `use_persistent_stores` is set.
    pub database: Option<DatabaseConfig>,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 3000;

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT").filter(|v| !v.is_empty()) {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: v })?,
            None => Self::DEFAULT_PORT,
        };

        let server_id = match lookup("SERVER_ID").filter(|v| !v.is_empty()) {
            Some(v) => Some(HeaderValue::from_str(&v).map_err(|_| ConfigError::Invalid {
                key: "SERVER_ID",
                value: v,
            })?),
            None => None,
        };

        let use_persistent_stores = match lookup("USE_PERSISTENT_STORES") {
            Some(v) => v.trim().parse::<bool>().map_err(|_| ConfigError::Invalid {
                key: "USE_PERSISTENT_STORES",
                value: v,
            })?,
            None => false,
        };

        let database = if use_persistent_stores {
            Some(DatabaseConfig::from_lookup(&lookup)?)
        } else {
            None
        };

        Ok(Self {
            port,
            server_id,
            use_persistent_stores,
            database,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn defaults_to_in_memory_on_port_3000() {
        let cfg = from(&[]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert!(!cfg.use_persistent_stores);
        assert!(cfg.database.is_none());
        assert!(cfg.server_id.is_none());
        assert_eq!(cfg.bind_addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn persistent_stores_need_database_settings() {
        assert_eq!(
            from(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err(),
            ConfigError::Missing("DB_HOST")
        );

        let cfg = from(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://u:p@h/db"),
            ("PORT", "9999"),
            ("SERVER_ID", "api-1"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9999);
        let db = cfg.database.unwrap();
        assert_eq!(db.connect_options.get_host(), "h");
        assert_eq!(db.connect_options.get_database(), Some("db"));
        assert_eq!(cfg.server_id.unwrap(), "api-1");
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(from(&[("PORT", "http")]), Err(ConfigError::Invalid { key: "PORT", .. })));
        assert!(matches!(
            from(&[("USE_PERSISTENT_STORES", "yes please")]),
            Err(ConfigError::Invalid { key: "USE_PERSISTENT_STORES", .. })
        ));
        assert!(matches!(
            from(&[("SERVER_ID", "bad\nid")]),
            Err(ConfigError::Invalid { key: "SERVER_ID", .. })
        ));
    }
}

//! Process Configuration
//!
//! Read once from the environment at start-up (after `.env` is loaded).

use std::env;
use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub database_max_connections: u32,
    pub password_pepper: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let password_pepper = lookup("PASSWORD_PEPPER").filter(|p| !p.is_empty());

        Ok(Self {
            database_url,
            bind_addr,
            database_max_connections,
            password_pepper,
        })
    }
}

// Never print the database password or the pepper
impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_max_connections", &self.database_max_connections)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/learning")]).unwrap();
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.database_max_connections, 5);
        assert!(config.password_pepper.is_none());
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config(&[
            ("DATABASE_URL", "postgres://db/learning"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("PASSWORD_PEPPER", "pepper"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.database_max_connections, 12);
        assert_eq!(config.password_pepper.as_deref(), Some("pepper"));
        assert!(!format!("{config:?}").contains("pepper\""));

        assert!(
            super::AppConfig::from_lookup(|key| match key {
                "DATABASE_URL" => Some("postgres://db".to_string()),
                "DATABASE_MAX_CONNECTIONS" => Some("many".to_string()),
                _ => None,
            })
            .is_err()
        );
    }
}

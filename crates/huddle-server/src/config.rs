//! Server configuration from the environment (and `.env`, if present).

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Env: `HUDDLE_JWT_SECRET`
    pub jwt_secret: String,
    /// Env: `HUDDLE_DB_PATH`
    pub db_path: PathBuf,
    /// Env: `HUDDLE_HOST`
    pub host: String,
    /// Env: `HUDDLE_PORT`
    pub port: u16,
    /// Session token lifetime in days.
    /// Env: `HUDDLE_TOKEN_TTL_DAYS`
    pub token_ttl_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".to_string(),
            db_path: PathBuf::from("huddle.db"),
            host: "0.0.0.0".to_string(),
            port: 3000,
            token_ttl_days: 30,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(secret) = std::env::var("HUDDLE_JWT_SECRET") {
            config.jwt_secret = secret;
        } else {
            tracing::warn!("HUDDLE_JWT_SECRET not set, using the development secret");
        }

        if let Ok(path) = std::env::var("HUDDLE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Ok(host) = std::env::var("HUDDLE_HOST") {
            config.host = host;
        }

        if let Ok(port) = std::env::var("HUDDLE_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("invalid HUDDLE_PORT '{}'", port))?;
        }

        if let Ok(days) = std::env::var("HUDDLE_TOKEN_TTL_DAYS") {
            config.token_ttl_days = days
                .parse()
                .with_context(|| format!("invalid HUDDLE_TOKEN_TTL_DAYS '{}'", days))?;
        }

        Ok(config)
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.token_ttl_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.addr().unwrap(), "0.0.0.0:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.token_ttl(), chrono::Duration::days(30));
    }

    #[test]
    fn bad_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(config.addr().is_err());
    }
}

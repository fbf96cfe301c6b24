//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_APP_URL: &str = "http://localhost:8080";
pub const DEFAULT_MAIL_FROM: &str = "no-reply@tradeerp.local";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid socket address: {value}")]
    InvalidAddr { var: &'static str, value: String },

    #[error("{var} must be an http(s) URL, got {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be a postgres:// URL")]
    InvalidDatabaseUrl { var: &'static str },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Enables Postgres-backed presence checks and migrations.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Base of links in mails and notification payloads.
    pub app_url: String,
    pub mail_from: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let bind = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind.parse().map_err(|_| ConfigError::InvalidAddr {
            var: "BIND_ADDR",
            value: bind.clone(),
        })?;

        let database_url = get("DATABASE_URL");
        if let Some(url) = &database_url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(ConfigError::InvalidDatabaseUrl { var: "DATABASE_URL" });
            }
        }

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_owned()
            }
        };

        let app_url = get("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_owned());
        if !(app_url.starts_with("http://") || app_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                var: "APP_URL",
                value: app_url,
            });
        }

        let mail_from = get("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_owned());
        if !mail_from.contains('@') {
            return Err(ConfigError::Empty { var: "MAIL_FROM" });
        }

        Ok(Self {
            bind_addr,
            database_url,
            jwt_secret,
            app_url: app_url.trim_end_matches('/').to_owned(),
            mail_from,
        })
    }
}

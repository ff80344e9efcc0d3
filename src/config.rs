use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Adds the `Secure` attribute to the session cookie.
    pub secure_cookie: bool,
    /// Sessions older than this stop authenticating and are pruned at login.
    pub max_age_hours: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://ecoride_db.sqlite?mode=rwc".into());
        let session = SessionConfig {
            secure_cookie: parse_or("SESSION_COOKIE_SECURE", false),
            max_age_hours: parse_or("SESSION_MAX_AGE_HOURS", 24 * 7),
        };
        Ok(Self {
            database_url,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("APP_PORT", 8080),
            session,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|e| {
            warn!(%key, value = %raw, error = %e, %default, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

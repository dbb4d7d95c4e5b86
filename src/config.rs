use actix_web::cookie::Key;
use chrono::TimeDelta;

use crate::workflow::cache::DEFAULT_TTL_SECS;

/// Runtime configuration, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub cache_ttl: TimeDelta,
    /// Mark the session cookie `Secure`; on when served over HTTPS.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 8);
        let ttl_secs = parse_or("WORKFLOW_CACHE_TTL_SECS", DEFAULT_TTL_SECS);
        let secure_cookies = parse_or("SECURE_COOKIES", false);

        Ok(Self {
            database_url,
            bind_addr,
            db_max_connections,
            cache_ttl: TimeDelta::seconds(ttl_secs),
            secure_cookies,
        })
    }
}

/// Session cookie key from `SESSION_KEY` (64+ bytes). A random fallback key
/// invalidates outstanding form tokens on restart.
pub fn session_key() -> Key {
    match std::env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), generating random key", val.len());
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set, generating random key");
            Key::generate()
        }
    }
}

fn parse_or<T: std::str::FromStr + std::fmt::Display + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid {key}='{raw}', using default {default}");
            default
        }),
        Err(_) => default,
    }
}

//! Server configuration from environment variables (optionally loaded from `.env`).
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `HOST` | `0.0.0.0` | bind address |
//! | `PORT` | `8080` | bind port |
//! | `DATABASE_URL` | unset | PostgreSQL URL; unset means the in-memory store |
//! | `DATABASE_MAX_CONNECTIONS` | `10` | pool size |
//! | `SEED_DIR` | `seed` | CSV reference data for the in-memory store |
//! | `SESSION_KEY` | random | at least 64 bytes; sessions survive restarts only when set |
//! | `SESSION_SECURE` | `true` | send the session cookie over HTTPS only |
//! | `STORE_TIMEOUT_SECS` | `10` | per store call |

use actix_web::cookie::Key;
use std::path::PathBuf;
use std::time::Duration;

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Minimum length of `SESSION_KEY` in bytes (signing + encryption key material).
pub const SESSION_KEY_MIN_LEN: usize = 64;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_dir: PathBuf,
    pub session_key: Option<Vec<u8>>,
    pub session_secure: bool,
    pub store_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: None,
            max_connections: 10,
            seed_dir: PathBuf::from("seed"),
            session_key: None,
            session_secure: true,
            store_timeout: Duration::from_secs(10),
        }
    }
}

fn parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid {}='{}'", name, raw);
            None
        }
    }
}

impl Config {
    /// Read the environment, falling back to defaults for anything unset or invalid.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            max_connections: parsed("DATABASE_MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
            seed_dir: std::env::var("SEED_DIR").map(PathBuf::from).unwrap_or(defaults.seed_dir),
            session_key: std::env::var("SESSION_KEY").ok().map(String::into_bytes),
            session_secure: parsed("SESSION_SECURE").unwrap_or(defaults.session_secure),
            store_timeout: parsed("STORE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.store_timeout),
        }
    }

    /// The configured session key, or a fresh random one (sessions then end on restart).
    pub fn session_key(&self) -> Key {
        match &self.session_key {
            Some(bytes) if bytes.len() >= SESSION_KEY_MIN_LEN => Key::from(bytes.as_slice()),
            Some(_) => {
                log::warn!(
                    "SESSION_KEY is shorter than {} bytes, using a random key",
                    SESSION_KEY_MIN_LEN
                );
                Key::generate()
            }
            None => {
                log::warn!("SESSION_KEY not set, using a random key");
                Key::generate()
            }
        }
    }
}

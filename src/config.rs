use std::env;
use std::time::Duration;

use crate::certificate::FetcherSettings;

/// Default timeout for connect, handshake and response, in milliseconds.
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub fetch_timeout_ms: u64,
    pub require_ok_status: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: lookup("DATABASE_PATH")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "certificates.db".to_string()),
            fetch_timeout_ms: lookup("FETCH_TIMEOUT_MS")
                .and_then(|t| t.parse().ok())
                .filter(|t| *t > 0)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT_MS),
            require_ok_status: lookup("REQUIRE_OK_STATUS")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
        }
    }

    pub fn fetcher_settings(&self) -> FetcherSettings {
        FetcherSettings {
            timeout: Duration::from_millis(self.fetch_timeout_ms),
            require_ok_status: self.require_ok_status,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

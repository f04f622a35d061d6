use anyhow::{anyhow, Result};
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub password_min_chars: usize,
    pub txn_max_retries: u32,
    pub change_buffer: usize,
    pub blob_base_url: String,
    pub active_window_days: i64,
}

impl AppConfig {
    /// Every knob has a default, so tests and demos run with an empty
    /// environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            password_min_chars: env_or_parse("PASSWORD_MIN_CHARS", "6")?,
            txn_max_retries: env_or_parse("LIKE_TXN_MAX_RETRIES", "32")?,
            change_buffer: env_or_parse("FEED_CHANGE_BUFFER", "64")?,
            blob_base_url: env_or("BLOB_BASE_URL", "mem://f2learn-media"),
            active_window_days: env_or_parse("ACTIVE_WINDOW_DAYS", "7")?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

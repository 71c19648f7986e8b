//! Process configuration from environment variables

use crate::paginate::{DEFAULT_PAGE_SIZE, MAX_MESSAGE_LEN};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bot_token: String,
    /// Liveness endpoint port
    pub port: u16,
    pub page_size: u64,
    pub max_message_len: usize,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
    /// Telegram user ids allowed to talk to the bot (empty = allow all)
    pub allowed_users: Vec<u64>,
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let page_size: u64 = parse_or(&lookup, "PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                key: "PAGE_SIZE",
                value: "0".to_string(),
            });
        }

        let allowed_users = match lookup("ALLOWED_USERS") {
            Some(value) => parse_allowlist(&value)?,
            None => Vec::new(),
        };

        Ok(Self {
            bot_token,
            port: parse_or(&lookup, "PORT", 8080)?,
            page_size,
            max_message_len: parse_or(&lookup, "MAX_MESSAGE_LEN", MAX_MESSAGE_LEN)?
                .min(MAX_MESSAGE_LEN)
                .max(2),
            session_ttl: Duration::from_secs(parse_or(&lookup, "SESSION_TTL_SECS", 3600)?),
            sweep_interval: Duration::from_secs(
                parse_or(&lookup, "SESSION_SWEEP_SECS", 60)?.max(1),
            ),
            allowed_users,
        })
    }

    pub fn is_allowed(&self, user_id: u64) -> bool {
        self.allowed_users.is_empty() || self.allowed_users.contains(&user_id)
    }
}

/// Comma-separated user ids; any unparseable entry fails the whole list
fn parse_allowlist(value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse().map_err(|_| ConfigError::Invalid {
                key: "ALLOWED_USERS",
                value: value.to_string(),
            })
        })
        .collect()
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

//! Configuration and settings management
//!
//! Loads settings from optional config files and environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application settings loaded once at startup
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Public bot username used for "open in DM" links.
    /// Taken from `getMe` when unset.
    pub bot_username: Option<String>,

    /// Username shown in the help text as the support contact
    pub support_contact: Option<String>,

    /// Path of the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Listen address of the keep-alive HTTP endpoint
    #[serde(default = "default_keepalive_addr")]
    pub keepalive_addr: SocketAddr,

    /// Timeout for a single membership lookup
    #[serde(default = "default_membership_check_timeout_secs")]
    pub membership_check_timeout_secs: u64,

    /// Maximum number of membership lookups in flight per report
    #[serde(default = "default_membership_check_concurrency")]
    pub membership_check_concurrency: usize,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("messages.db")
}

fn default_keepalive_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

const fn default_membership_check_timeout_secs() -> u64 {
    10
}

const fn default_membership_check_concurrency() -> usize {
    8
}

/// Build the layered configuration source.
///
/// # Errors
///
/// Returns a `ConfigError` if a present config file cannot be parsed.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    let mut builder = Config::builder();

    // `BOT_TOKEN` is accepted as a lowest-priority alias for `TELEGRAM_TOKEN`
    if let Ok(val) = std::env::var("BOT_TOKEN") {
        if !val.is_empty() {
            builder = builder.set_default("telegram_token", val)?;
        }
    }

    builder
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        // Eg.. `APP__DATABASE_PATH=/data/bot.db`
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Plain UPPER_SNAKE_CASE variables map onto snake_case keys
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or no bot token is set.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Per-group membership lookup timeout
    #[must_use]
    pub const fn membership_check_timeout(&self) -> Duration {
        Duration::from_secs(self.membership_check_timeout_secs)
    }

    /// Username for `t.me` links, without a leading `@`.
    ///
    /// Falls back to `fallback` (the name reported by Telegram) when no
    /// username is configured.
    #[must_use]
    pub fn bot_username_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.bot_username
            .as_deref()
            .map(|name| name.trim_start_matches('@'))
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn settings() -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            bot_username: None,
            support_contact: None,
            database_path: default_database_path(),
            keepalive_addr: default_keepalive_addr(),
            membership_check_timeout_secs: 3,
            membership_check_concurrency: 8,
        }
    }

    // Environment mutations stay inside one test to avoid races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        // 1. Standard variable plus defaults
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.database_path, PathBuf::from("messages.db"));
        assert_eq!(settings.keepalive_addr.port(), 8080);
        assert_eq!(settings.membership_check_timeout(), Duration::from_secs(10));
        assert_eq!(settings.support_contact, None);
        env::remove_var("TELEGRAM_TOKEN");

        // 2. BOT_TOKEN alias
        env::set_var("BOT_TOKEN", "alias_token");
        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "alias_token");
        env::remove_var("BOT_TOKEN");

        // 3. Overrides
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("DATABASE_PATH", "/tmp/tracker/bot.db");
        env::set_var("KEEPALIVE_ADDR", "127.0.0.1:9000");
        env::set_var("SUPPORT_CONTACT", "@Emranrx");
        let settings = Settings::new()?;
        assert_eq!(settings.support_contact.as_deref(), Some("@Emranrx"));
        assert_eq!(settings.database_path, PathBuf::from("/tmp/tracker/bot.db"));
        assert_eq!(settings.keepalive_addr, "127.0.0.1:9000".parse::<SocketAddr>()?);
        env::remove_var("DATABASE_PATH");
        env::remove_var("KEEPALIVE_ADDR");
        env::remove_var("SUPPORT_CONTACT");

        // 4. Missing token
        env::remove_var("TELEGRAM_TOKEN");
        assert!(Settings::new().is_err());
        Ok(())
    }

    #[test]
    fn test_bot_username_fallback() {
        let mut s = settings();
        assert_eq!(s.bot_username_or("from_get_me"), "from_get_me");

        s.bot_username = Some("@EmTrack_bot".to_string());
        assert_eq!(s.bot_username_or("from_get_me"), "EmTrack_bot");

        s.bot_username = Some(String::new());
        assert_eq!(s.bot_username_or("from_get_me"), "from_get_me");
    }
}

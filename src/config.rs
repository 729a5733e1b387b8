//! Configuration and settings management
//!
//! Loads settings from optional config files and environment variables.

use crate::album::AlbumConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use teloxide::types::{ChatId, Recipient};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub bot_token: String,

    /// Destination channel: numeric chat ID or `@username`
    pub channel_id: String,

    /// Static key the operator must submit to unlock posting
    pub secret_key: String,

    /// Path to the watermark image overlaid on every published photo
    #[serde(default = "default_watermark_path")]
    pub watermark_path: PathBuf,

    /// Directory for downloaded and watermarked images
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Quiet period after the last album item before the album is released
    #[serde(default = "default_album_latency_ms")]
    pub album_latency_ms: u64,

    /// Hard ceiling on album buffering, measured from the first item.
    /// Unset means albums wait for a quiet period however long it takes.
    #[serde(default)]
    pub album_max_wait_ms: Option<u64>,
}

fn default_watermark_path() -> PathBuf {
    PathBuf::from("watermark.png")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

const fn default_album_latency_ms() -> u64 {
    DEFAULT_ALBUM_LATENCY_MS
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use channel_poster::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value is empty.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__SECRET_KEY=... ./target/app` sets `secret_key`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables map to snake_case keys;
            // empty values are treated as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("bot_token", &self.bot_token),
            ("channel_id", &self.channel_id),
            ("secret_key", &self.secret_key),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Resolves the destination channel into a Telegram recipient.
    ///
    /// Numeric values are chat IDs, anything else is a public channel username.
    #[must_use]
    pub fn channel_recipient(&self) -> Recipient {
        let raw = self.channel_id.trim();
        match raw.parse::<i64>() {
            Ok(id) => Recipient::Id(ChatId(id)),
            Err(_) if raw.starts_with('@') => Recipient::ChannelUsername(raw.to_string()),
            Err(_) => Recipient::ChannelUsername(format!("@{raw}")),
        }
    }

    /// Debounce parameters for the album aggregator.
    #[must_use]
    pub fn album_config(&self) -> AlbumConfig {
        AlbumConfig {
            window: Duration::from_millis(self.album_latency_ms),
            max_wait: self.album_max_wait_ms.map(Duration::from_millis),
        }
    }
}

/// Default debounce window for media groups (milliseconds)
pub const DEFAULT_ALBUM_LATENCY_MS: u64 = 100;

/// Initial delay between retries of operator replies (milliseconds)
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for the delay between retries (milliseconds)
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;
/// Number of retries for operator replies
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;

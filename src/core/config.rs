//! Bot configuration
//!
//! Non-secret settings are read from a YAML file; the Discord token and the
//! OpenAI key come from the environment (optionally via `.env`).
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Explicit IANA time zone, configurable command prefix
//! - 1.0.0: YAML config with env secrets

use anyhow::Result;
use chrono_tz::Tz;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordSettings,

    #[serde(default)]
    pub openai: OpenAiSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub reminder: ReminderSettings,

    /// IANA zone every parsed and displayed instant is expressed in
    #[serde(default = "default_timezone")]
    pub timezone: Tz,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(skip)]
    pub discord_token: String,

    #[serde(skip)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordSettings {
    /// The only identity the bot answers, and the recipient of reminders
    pub allowed_user_id: u64,

    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderSettings {
    /// Seconds between scheduler cycles
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            check_interval: default_check_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Rotating log file written alongside stderr; `null` disables it
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_timezone() -> Tz {
    chrono_tz::UTC
}

fn default_command_prefix() -> String {
    "/todo".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_database_path() -> String {
    "junbot.db".to_string()
}

fn default_check_interval() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> Option<String> {
    Some("junbot.log".to_string())
}

impl Config {
    /// Load settings from `path` and secrets from the environment
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path, e))?;
        let mut config = Self::from_yaml(&contents)?;

        config.discord_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN not set"))?;
        config.openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        Ok(config)
    }

    /// Parse and validate the YAML settings, without touching the environment
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord.allowed_user_id == 0 {
            return Err(anyhow::anyhow!("discord.allowed_user_id must be set"));
        }

        let prefix = &self.discord.command_prefix;
        if prefix.is_empty() || prefix.chars().any(char::is_whitespace) {
            return Err(anyhow::anyhow!(
                "discord.command_prefix must be a single token: {:?}",
                prefix
            ));
        }

        if self.reminder.check_interval == 0 {
            return Err(anyhow::anyhow!("reminder.check_interval must be positive"));
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(anyhow::anyhow!(
                "openai.temperature out of range (0.0-2.0): {}",
                self.openai.temperature
            ));
        }

        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.reminder.check_interval)
    }
}

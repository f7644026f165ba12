//! # Configuration Management Module
//!
//! LifeLeveler reads a single TOML file at startup. Every section has defaults, so a
//! missing section or key falls back rather than failing the load.
//!
//! ## Configuration Structure
//!
//! - [`TrackerConfig`] - Player-facing behaviour (display name, quotes, daily reset)
//! - [`StorageConfig`] - Where the sled database lives
//! - [`LoggingConfig`] - Log level and optional log file
//! - [`AuthConfig`] - Local account backend: session lifetime, password policy, argon2 cost
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lifeleveler::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let config = Config::load("config.toml").await?;
//!     println!("Database: {}", config.tracker_db_path().display());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [tracker]
//! player_name = "Adventurer"
//! show_quotes = true
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "lifeleveler.log"
//!
//! [auth]
//! session_ttl_minutes = 10080
//! min_password_length = 6
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Name used in the status greeting.
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Print a motivational quote with `status`.
    #[serde(default = "default_true")]
    pub show_quotes: bool,
    /// Reset repeatable daily quests automatically on the first visit of a new day.
    #[serde(default)]
    pub auto_daily_reset: bool,
}

fn default_player_name() -> String {
    "Adventurer".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            player_name: default_player_name(),
            show_quotes: true,
            auto_daily_reset: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Sled directory name inside `data_dir`.
    #[serde(default = "default_db_name")]
    pub db_name: String,
}

fn default_db_name() -> String {
    "tracker.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_name: default_db_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Argon2Config {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub time_cost: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

impl Argon2Config {
    /// Build argon2 params, filling unset fields from the library defaults.
    /// Returns `None` when the combination is rejected.
    pub fn params(&self) -> Option<argon2::Params> {
        let builder = argon2::Params::DEFAULT;
        let mem = self.memory_kib.unwrap_or(builder.m_cost());
        let time = self.time_cost.unwrap_or(builder.t_cost());
        let para = self.parallelism.unwrap_or(builder.p_cost());
        argon2::Params::new(mem, time, para, None).ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_session_ttl")]
    pub session_ttl_minutes: u32,
    #[serde(default = "default_min_password")]
    pub min_password_length: usize,
    #[serde(default)]
    pub argon2: Option<Argon2Config>,
}

fn default_session_ttl() -> u32 {
    7 * 24 * 60
}

fn default_min_password() -> usize {
    6
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: default_session_ttl(),
            min_password_length: default_min_password(),
            argon2: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.storage.db_name.trim().is_empty() {
            return Err(anyhow!("storage.db_name must not be empty"));
        }
        if self.auth.min_password_length == 0 {
            return Err(anyhow!("auth.min_password_length must be at least 1"));
        }
        Ok(())
    }

    /// Full path of the tracker database directory.
    pub fn tracker_db_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir).join(&self.storage.db_name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tracker: TrackerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("lifeleveler.log".to_string()),
            },
            auth: AuthConfig::default(),
        }
    }
}

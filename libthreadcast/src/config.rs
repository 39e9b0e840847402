//! Configuration management for Threadcast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub account: AccountConfig,
    #[serde(default)]
    pub posting: PostingConfig,
    #[serde(default)]
    pub segments: SegmentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Identity used to namespace cache keys and select the source room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_account_name")]
    pub name: String,
    /// Room id passed to the source feed when listing unconsumed items
    #[serde(default = "default_room")]
    pub room: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            name: default_account_name(),
            room: default_room(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingConfig {
    /// Lower bound of the jittered posting interval, in minutes
    #[serde(default = "default_interval_min")]
    pub interval_min_minutes: u64,
    /// Upper bound of the jittered posting interval, in minutes
    #[serde(default = "default_interval_max")]
    pub interval_max_minutes: u64,
    /// Run one publishing pass on startup before entering the normal loop
    #[serde(default)]
    pub post_immediately: bool,
    /// Log segments instead of publishing; leaves ledger and cache untouched
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            interval_min_minutes: default_interval_min(),
            interval_max_minutes: default_interval_max(),
            post_immediately: false,
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Hard upper bound on segment length, in characters
    #[serde(default = "default_max_len")]
    pub max_len: usize,
    /// Segments below this length are only acceptable as the final segment
    #[serde(default = "default_min_len")]
    pub min_len: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_len: default_max_len(),
            min_len: default_min_len(),
        }
    }
}

fn default_account_name() -> String {
    "default".to_string()
}

fn default_room() -> String {
    "analysis".to_string()
}

fn default_interval_min() -> u64 {
    90
}

fn default_interval_max() -> u64 {
    180
}

fn default_max_len() -> usize {
    280
}

fn default_min_len() -> usize {
    250
}

impl Config {
    /// Load configuration from the default location, applying environment
    /// overrides (`POST_INTERVAL_MIN`, `POST_INTERVAL_MAX`,
    /// `POST_IMMEDIATELY`, `DRY_RUN`).
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        let mut config = Self::load_from_path(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            database: DatabaseConfig {
                path: "~/.local/share/threadcast/threadcast.db".to_string(),
            },
            account: AccountConfig::default(),
            posting: PostingConfig::default(),
            segments: SegmentConfig::default(),
        }
    }

    /// Apply environment variable overrides to the posting settings.
    ///
    /// Unparseable values are logged and ignored rather than failing startup,
    /// keeping the file-based settings in effect.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("POST_INTERVAL_MIN") {
            match raw.trim().parse::<u64>() {
                Ok(minutes) => self.posting.interval_min_minutes = minutes,
                Err(_) => warn!("Ignoring unparseable POST_INTERVAL_MIN: {:?}", raw),
            }
        }
        if let Ok(raw) = std::env::var("POST_INTERVAL_MAX") {
            match raw.trim().parse::<u64>() {
                Ok(minutes) => self.posting.interval_max_minutes = minutes,
                Err(_) => warn!("Ignoring unparseable POST_INTERVAL_MAX: {:?}", raw),
            }
        }
        if let Ok(raw) = std::env::var("POST_IMMEDIATELY") {
            match parse_boolean_from_text(&raw) {
                Some(value) => self.posting.post_immediately = value,
                None => warn!("Ignoring unparseable POST_IMMEDIATELY: {:?}", raw),
            }
        }
        if let Ok(raw) = std::env::var("DRY_RUN") {
            match parse_boolean_from_text(&raw) {
                Some(value) => self.posting.dry_run = value,
                None => warn!("Ignoring unparseable DRY_RUN: {:?}", raw),
            }
        }
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.posting.interval_min_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "posting.interval_min_minutes".to_string(),
                message: "must be at least 1".to_string(),
            }
            .into());
        }
        if self.posting.interval_min_minutes > self.posting.interval_max_minutes {
            return Err(ConfigError::InvalidValue {
                field: "posting.interval_max_minutes".to_string(),
                message: "must be >= interval_min_minutes".to_string(),
            }
            .into());
        }
        if self.segments.max_len == 0 || self.segments.min_len >= self.segments.max_len {
            return Err(ConfigError::InvalidValue {
                field: "segments.min_len".to_string(),
                message: "must be less than segments.max_len".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Parse a boolean-like configuration string.
///
/// Accepts the usual affirmative/negative spellings; returns `None` for
/// anything unrecognized so callers can decide how to handle it.
pub fn parse_boolean_from_text(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" | "enable" | "enabled" => Some(true),
        "false" | "0" | "no" | "n" | "off" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("THREADCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("threadcast").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("threadcast"))
}

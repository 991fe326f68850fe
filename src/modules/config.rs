use std::env;
use std::path::PathBuf;

use log::LevelFilter;

use crate::modules::utils::logging::parse_level;

pub const DATA_DIR_ENV: &str = "SESSION_VAULT_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "SESSION_VAULT_LOG";

const DEFAULT_DATA_DIR: &str = ".session-vault";
const DEFAULT_LOG_FILE: &str = "session-vault.log";

/// Runtime settings for the command-line front end
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
}

impl AppConfig {
    /// Create configuration with default values
    pub fn new() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: LevelFilter::Info,
        }
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            config.log_level = parse_level(&level);
        }
        config
    }

    /// Apply command-line overrides on top of the current values
    pub fn with_overrides(mut self, data_dir: Option<&str>, log_level: Option<&str>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = log_level {
            self.log_level = parse_level(level);
        }
        self
    }

    /// The log file lives inside the data directory
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

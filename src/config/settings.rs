//! Tool settings
//!
//! Layered configuration: defaults → settings file → environment variables.
//! These control the tool itself; user key/value entries live in the
//! [`ConfigStore`](super::ConfigStore).

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Prefix for environment variables that override [`Settings`] fields
pub const SETTINGS_ENV_PREFIX: &str = "URBAN_CLI_";

/// Tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Location of the key/value store (defaults to the OS config dir)
    pub config_file: Option<PathBuf>,

    /// Prefix for environment variables that override stored keys
    pub env_prefix: String,

    /// Characters kept visible at each end of a masked value
    pub mask_keep: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_file: None,
            env_prefix: "UR_".to_string(),
            mask_keep: 2,
        }
    }
}

impl Settings {
    /// Load settings from all sources
    pub fn load() -> Result<Self> {
        let settings_path = Self::settings_file_path()?;
        Self::load_from(&settings_path)
    }

    /// Load settings using a specific settings file
    pub fn load_from(settings_path: &Path) -> Result<Self> {
        Self::figment(settings_path)
            .extract()
            .map_err(|e| ConfigError::Settings(e.to_string()).into())
    }

    fn figment(settings_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(settings_path))
            // URBAN_CLI_CONFIG_FILE, URBAN_CLI_ENV_PREFIX, URBAN_CLI_MASK_KEEP
            .merge(Env::prefixed(SETTINGS_ENV_PREFIX))
    }

    /// Resolve the store location: explicit setting, else the OS config dir
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.config_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join("config.json")),
        }
    }

    /// Get the settings file path
    pub fn settings_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.toml"))
    }

    /// Get the configuration directory path
    pub fn config_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().to_path_buf())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("org", "urban-researcher", "urban-cli")
            .ok_or_else(|| ConfigError::NoHomeDirectory.into())
    }
}

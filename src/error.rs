//! Error types for urban-cli
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for urban-cli
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration store and settings errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("Value for '{0}' is empty")]
    EmptyValue(String),

    #[error("Key not set: {0}")]
    NotFound(String),

    #[error("Failed to access config store {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config store {path} is corrupt ({reason}); fix or delete the file")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to load settings: {0}")]
    Settings(String),

    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

impl ConfigError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Storage {
            path: path.into(),
            source,
        }
    }
}

/// Project layout errors
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project name is empty")]
    EmptyName,

    #[error("Path already exists and is not empty: {0}")]
    PathExists(PathBuf),

    #[error("Not a project: {path} ({reason})")]
    NotAProject { path: PathBuf, reason: String },

    #[error("Failed to create project at {path}: {source}")]
    CreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

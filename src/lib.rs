//! Urban Researcher CLI - configuration and project management for
//! AI-assisted urban research workflows
//!
//! # Modules
//!
//! - [`config`] - Tool settings, the key/value store with environment
//!   overrides, and atomic file replacement
//! - [`project`] - Project directories and their `project.json` metadata
//! - [`output`] - Plain-text rendering of command results
//! - [`logging`] - `time | level | target | message` log lines on stderr
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod project;

pub use config::{ConfigStore, Environment, Settings};
pub use error::{Error, Result};
pub use project::{ProjectManager, ProjectMetadata, ProjectStatus};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

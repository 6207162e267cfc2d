//! Configuration and persistence module
//!
//! Handles:
//! - Tool settings (`<config dir>/settings.toml`, `URBAN_CLI_*`)
//! - The key/value store (`<config dir>/config.json`, `UR_*` overrides)
//! - Atomic file replacement shared with project metadata

mod env;
mod settings;
mod storage;
mod store;

pub use env::*;
pub use settings::*;
pub use storage::*;
pub use store::*;

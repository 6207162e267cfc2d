//! Project management
//!
//! Defines the on-disk project model:
//! - `ProjectMetadata` is the `project.json` record marking a project root
//! - `ProjectManager` creates the standard layout and reports its status

mod manager;
mod types;

pub use manager::ProjectManager;
pub use types::*;

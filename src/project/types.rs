//! Project metadata types
//!
//! A project is a directory holding a `project.json` record plus the
//! standard research layout.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File that marks a directory as a project
pub const METADATA_FILE: &str = "project.json";

/// Directories created inside every project
pub const STANDARD_DIRS: [&str; 4] = ["data", "outputs", "logs", "notes"];

/// Current `project.json` schema
pub const SCHEMA_VERSION: u32 = 1;

/// Unique identifier for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Create a new random project ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Use first 8 chars for display
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Contents of `project.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Unique identifier
    pub id: ProjectId,
    /// Name as given to `init`
    pub name: String,
    /// Filesystem-safe form of the name
    pub slug: String,
    /// When the project was initialized
    pub created_at: DateTime<Utc>,
    /// Version of the tool that created the project
    pub tool_version: String,
    /// Layout/record schema version
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl ProjectMetadata {
    /// Create metadata for a new project
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: ProjectId::new(),
            slug: slugify(&name),
            name,
            created_at: Utc::now(),
            tool_version: crate::VERSION.to_string(),
            schema_version: SCHEMA_VERSION,
        }
    }
}

/// Presence of one standard layout directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirCheck {
    pub name: &'static str,
    pub present: bool,
}

/// Summary returned by [`ProjectManager::status`](super::ProjectManager::status)
#[derive(Debug, Clone)]
pub struct ProjectStatus {
    /// Absolute project root
    pub root: PathBuf,
    /// Parsed `project.json`
    pub metadata: ProjectMetadata,
    /// One entry per standard directory, in layout order
    pub dirs: Vec<DirCheck>,
}

impl ProjectStatus {
    /// Standard directories that are absent
    pub fn missing(&self) -> Vec<&'static str> {
        self.dirs
            .iter()
            .filter(|d| !d.present)
            .map(|d| d.name)
            .collect()
    }

    /// Metadata is valid and the whole layout is present
    pub fn is_complete(&self) -> bool {
        self.dirs.iter().all(|d| d.present)
    }
}

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}_-]+").expect("static regex"));
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex"));

/// Filesystem-safe directory name for a project name
pub fn slugify(name: &str) -> String {
    let replaced = UNSAFE_RUN.replace_all(name.trim(), "-");
    let collapsed = DASH_RUN.replace_all(&replaced, "-");
    let slug = collapsed.trim_matches('-');
    if slug.is_empty() {
        "project".to_string()
    } else {
        slug.to_string()
    }
}

//! Project manager - initializes and inspects project directories
//!
//! `init` is all-or-nothing: everything it creates is tracked by a
//! [`CreationGuard`] and removed again if any step fails.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::config::write_atomic;
use crate::error::{ProjectError, Result};

use super::{DirCheck, METADATA_FILE, ProjectMetadata, ProjectStatus, STANDARD_DIRS};

/// Creates and inspects projects relative to a base directory
#[derive(Debug, Clone)]
pub struct ProjectManager {
    base_dir: PathBuf,
}

impl ProjectManager {
    /// Create a manager resolving relative paths against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create a manager rooted at the current working directory
    pub fn from_current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// Initialize a project named `name`
    ///
    /// The target defaults to `<base_dir>/<slug>`. An existing empty
    /// directory is reused; anything else already at the target is refused.
    /// Returns the absolute project root.
    #[instrument(skip(self))]
    pub fn init(&self, name: &str, target_dir: Option<&Path>) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectError::EmptyName.into());
        }

        let metadata = ProjectMetadata::new(name);
        let root = self.resolve(target_dir.unwrap_or(Path::new(&metadata.slug)))?;
        ensure_vacant(&root)?;

        let creation_failed = |source: io::Error| ProjectError::CreationFailed {
            path: root.clone(),
            source,
        };

        let mut guard = CreationGuard::default();
        guard.create_dir_all(&root).map_err(creation_failed)?;
        for dir in STANDARD_DIRS {
            guard.create_dir(&root.join(dir)).map_err(creation_failed)?;
        }

        let mut record = serde_json::to_string_pretty(&metadata)
            .map_err(|e| creation_failed(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        record.push('\n');
        guard
            .write_file(&root.join(METADATA_FILE), record.as_bytes())
            .map_err(creation_failed)?;

        guard.disarm();
        info!("Created project '{}' at {}", metadata.name, root.display());
        Ok(root)
    }

    /// Inspect the project rooted at `dir`
    #[instrument(skip(self))]
    pub fn status(&self, dir: &Path) -> Result<ProjectStatus> {
        let root = self.resolve(dir)?;
        let meta_path = root.join(METADATA_FILE);

        let not_a_project = |reason: String| ProjectError::NotAProject {
            path: root.clone(),
            reason,
        };

        let content = match std::fs::read(&meta_path) {
            Ok(content) => content,
            // `dir` itself may be a regular file
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                return Err(not_a_project(format!("{} not found", METADATA_FILE)).into());
            }
            Err(e) if e.kind() == io::ErrorKind::IsADirectory => {
                return Err(not_a_project(format!("{} is not a file", METADATA_FILE)).into());
            }
            Err(e) => return Err(e.into()),
        };

        let metadata: ProjectMetadata = serde_json::from_slice(&content)
            .map_err(|e| not_a_project(format!("invalid {}: {}", METADATA_FILE, e)))?;

        let dirs: Vec<DirCheck> = STANDARD_DIRS
            .iter()
            .map(|&name| DirCheck {
                name,
                present: root.join(name).is_dir(),
            })
            .collect();

        let status = ProjectStatus {
            root,
            metadata,
            dirs,
        };
        let missing = status.missing();
        if !missing.is_empty() {
            warn!("Project layout incomplete, missing: {}", missing.join(", "));
        }

        Ok(status)
    }

    fn resolve(&self, dir: &Path) -> Result<PathBuf> {
        Ok(std::path::absolute(self.base_dir.join(dir))?)
    }
}

/// Refuse targets that hold anything
fn ensure_vacant(root: &Path) -> Result<()> {
    match std::fs::symlink_metadata(root) {
        // A file somewhere up the path surfaces later as a creation failure
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ) =>
        {
            Ok(())
        }
        Err(e) => Err(e.into()),
        Ok(meta) if meta.is_dir() => {
            if std::fs::read_dir(root)?.next().is_some() {
                Err(ProjectError::PathExists(root.to_path_buf()).into())
            } else {
                debug!("Reusing empty directory {}", root.display());
                Ok(())
            }
        }
        Ok(_) => Err(ProjectError::PathExists(root.to_path_buf()).into()),
    }
}

/// Records filesystem entries created during `init` and removes them on drop
/// unless disarmed
#[derive(Debug)]
struct CreationGuard {
    created: Vec<PathBuf>,
    armed: bool,
}

impl Default for CreationGuard {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            armed: true,
        }
    }
}

impl CreationGuard {
    fn create_dir(&mut self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)?;
        self.created.push(path.to_path_buf());
        Ok(())
    }

    /// Create `path` and any missing ancestors, tracking each one
    fn create_dir_all(&mut self, path: &Path) -> io::Result<()> {
        let missing: Vec<&Path> = path.ancestors().take_while(|p| !p.exists()).collect();
        for dir in missing.into_iter().rev() {
            self.create_dir(dir)?;
        }
        Ok(())
    }

    fn write_file(&mut self, path: &Path, contents: &[u8]) -> io::Result<()> {
        write_atomic(path, contents)?;
        self.created.push(path.to_path_buf());
        Ok(())
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CreationGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        for path in self.created.iter().rev() {
            let removed = if path.is_dir() {
                std::fs::remove_dir_all(path)
            } else {
                std::fs::remove_file(path)
            };
            match removed {
                Ok(()) => debug!("Rolled back {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to roll back {}: {}", path.display(), e),
            }
        }
    }
}

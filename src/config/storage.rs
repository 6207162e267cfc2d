//! Atomic file replacement
//!
//! Every persisted file goes through the temp-file + fsync + rename pattern:
//! 1. Write the full contents to a temporary file in the target's directory
//! 2. fsync the temporary file
//! 3. Rename it over the target (atomic on POSIX and NTFS)
//!
//! Readers therefore only ever observe the old file or the new one.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Fully written contents waiting to replace `target`
///
/// Dropping a `StagedWrite` without calling [`commit`](Self::commit) deletes
/// the temporary file and leaves `target` untouched.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    file: NamedTempFile,
}

impl StagedWrite {
    /// Write `contents` next to `target` without touching `target` itself
    pub fn new(target: &Path, contents: &[u8]) -> io::Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::Builder::new()
            .prefix(".urban-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        file.write_all(contents)?;
        file.as_file().sync_all()?;

        debug!("Staged {} bytes for {}", contents.len(), target.display());

        Ok(Self {
            target: target.to_path_buf(),
            file,
        })
    }

    /// Path of the temporary file holding the staged contents
    pub fn staged_path(&self) -> &Path {
        self.file.path()
    }

    /// Atomically replace the target with the staged contents
    pub fn commit(self) -> io::Result<()> {
        self.file.persist(&self.target).map_err(|e| e.error)?;
        debug!("Replaced {}", self.target.display());
        Ok(())
    }
}

/// Atomically replace `target` with `contents`
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    StagedWrite::new(target, contents)?.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_atomic_creates_and_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nested").join("file.json");

        write_atomic(&target, b"first").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "first");

        write_atomic(&target, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
        assert_eq!(dir_entries(target.parent().unwrap()), vec!["file.json"]);
    }

    #[test]
    fn test_interrupted_write_leaves_target_intact() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("file.json");
        write_atomic(&target, b"old").unwrap();

        let staged = StagedWrite::new(&target, b"new contents").unwrap();
        let staged_path = staged.staged_path().to_path_buf();
        assert!(staged_path.exists());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "old");

        // Process "dies" before the rename
        drop(staged);

        assert!(!staged_path.exists());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "old");
        assert_eq!(dir_entries(temp_dir.path()), vec!["file.json"]);
    }

    #[test]
    fn test_stage_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = write_atomic(&blocker.join("file.json"), b"x");
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "not a directory");
    }
}

//! Verbatim copies of source asset files

use sceneopt_core::Result;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Prefix of every path inside the mutable content tree
pub const CONTENT_ROOT: &str = "Assets/";

/// Copies asset files under a backup directory before they are modified
///
/// Each source path is copied at most once; an existing copy is never
/// overwritten because it already holds the oldest known state.
#[derive(Debug, Clone)]
pub struct FileBackup {
    project_root: PathBuf,
    backup_dir: PathBuf,
}

impl FileBackup {
    /// `backup_dir` is relative to `project_root`
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(project_root: P, backup_dir: Q) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            backup_dir: backup_dir.as_ref().to_path_buf(),
        }
    }

    pub fn backup_root(&self) -> PathBuf {
        self.project_root.join(&self.backup_dir)
    }

    /// Where the copy of `asset_path` lives, `None` outside the content tree
    ///
    /// The part after [`CONTENT_ROOT`] must be plain names only, so `..`,
    /// `.` and rooted remainders are refused.
    pub fn backup_path(&self, asset_path: &str) -> Option<PathBuf> {
        let relative = Path::new(asset_path.strip_prefix(CONTENT_ROOT)?);
        let mut components = relative.components().peekable();
        components.peek()?;
        if !components.all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.backup_root().join(relative))
    }

    /// Copy `asset_path` if no copy exists yet
    ///
    /// Returns the path of a newly written copy, `Ok(None)` when there was
    /// nothing to do.
    pub fn create(&self, asset_path: &str) -> Result<Option<PathBuf>> {
        let Some(target) = self.backup_path(asset_path) else {
            log::debug!("'{asset_path}' is outside {CONTENT_ROOT}, not backing up");
            return Ok(None);
        };
        if target.exists() {
            return Ok(None);
        }
        let source = self.project_root.join(asset_path);
        if !source.is_file() {
            return Ok(None);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&source, &target)?;
        log::debug!("backed up {asset_path} to {}", target.display());
        Ok(Some(target))
    }

    /// [`create`](Self::create), logging failures instead of returning them
    pub fn create_or_warn(&self, asset_path: &str) {
        if let Err(e) = self.create(asset_path) {
            log::warn!("could not back up '{asset_path}': {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copies_once_and_never_overwrites() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Assets/Textures")).unwrap();
        fs::write(dir.path().join("Assets/Textures/wall.png"), b"original").unwrap();

        let backup = FileBackup::new(dir.path(), "Assets/SceneOpt/Backups");
        let copy = backup.create("Assets/Textures/wall.png").unwrap().unwrap();
        assert_eq!(copy, dir.path().join("Assets/SceneOpt/Backups/Textures/wall.png"));

        fs::write(dir.path().join("Assets/Textures/wall.png"), b"changed").unwrap();
        assert!(backup.create("Assets/Textures/wall.png").unwrap().is_none());
        assert_eq!(fs::read(&copy).unwrap(), b"original");
    }

    #[test]
    fn test_ignores_paths_outside_content() {
        let dir = tempdir().unwrap();
        let backup = FileBackup::new(dir.path(), "Assets/SceneOpt/Backups");
        assert!(backup.backup_path("Packages/lib/tex.png").is_none());
        assert!(backup.create("Packages/lib/tex.png").unwrap().is_none());
        assert!(backup.create("Assets/").unwrap().is_none());
    }

    #[test]
    fn test_refuses_paths_leaving_content() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("proj");
        fs::create_dir_all(root.join("Assets")).unwrap();
        fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let backup = FileBackup::new(&root, "Assets/Backups");
        assert!(backup.backup_path("Assets/../../secret.txt").is_none());
        assert!(backup.backup_path("Assets/Textures/../../x.png").is_none());
        assert!(backup.backup_path("Assets//etc/passwd").is_none());
        assert!(backup.backup_path("Assets/./a.png").is_none());

        assert!(backup.create("Assets/../../secret.txt").unwrap().is_none());
        assert!(!root.join("secret.txt").exists());
        assert!(!root.join("Assets/Backups").exists());
    }

    #[test]
    fn test_missing_source_is_skipped() {
        let dir = tempdir().unwrap();
        let backup = FileBackup::new(dir.path(), "Backups");
        assert!(backup.create("Assets/gone.wav").unwrap().is_none());
        assert!(!dir.path().join("Backups").exists());
    }
}

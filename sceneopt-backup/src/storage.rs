//! Where a snapshot document lives between sessions

use crate::snapshot::SnapshotDocument;
use sceneopt_core::Result;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Read and write the whole snapshot document
pub trait SnapshotStorage {
    /// `Ok(None)` when nothing has been stored yet
    fn read(&self) -> Result<Option<SnapshotDocument>>;

    fn write(&mut self, document: &SnapshotDocument) -> Result<()>;
}

/// Pretty-printed JSON file, replaced atomically on every write
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStorage for FileStorage {
    fn read(&self) -> Result<Option<SnapshotDocument>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(SnapshotDocument::from_json(&text)?))
    }

    fn write(&mut self, document: &SnapshotDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = document.to_json()?;
        let temp = self.temp_path();
        fs::write(&temp, text)?;
        fs::rename(&temp, &self.path)?;
        log::trace!("wrote snapshot document to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    json: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
    writes: usize,
}

/// Storage kept in memory as serialized JSON
///
/// Clones share the same contents, so a test can keep a handle after moving
/// one into a store and inspect or sabotage it later.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw stored text, which need not be valid JSON
    pub fn with_contents(json: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.inner.borrow_mut().json = Some(json.into());
        storage
    }

    pub fn contents(&self) -> Option<String> {
        self.inner.borrow().json.clone()
    }

    pub fn document(&self) -> Option<SnapshotDocument> {
        self.contents()
            .and_then(|json| SnapshotDocument::from_json(&json).ok())
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.borrow_mut().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self) -> Result<Option<SnapshotDocument>> {
        let inner = self.inner.borrow();
        if inner.fail_reads {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "snapshot storage is unreadable",
            )
            .into());
        }
        match &inner.json {
            Some(json) => Ok(Some(SnapshotDocument::from_json(json)?)),
            None => Ok(None),
        }
    }

    fn write(&mut self, document: &SnapshotDocument) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "snapshot storage is read-only",
            )
            .into());
        }
        inner.json = Some(document.to_json()?);
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{MaterialSnapshot, PropertySnapshot};
    use sceneopt_core::MaterialSettings;
    use tempfile::tempdir;

    fn sample() -> SnapshotDocument {
        let mut doc = SnapshotDocument::default();
        doc.push(PropertySnapshot::Material(MaterialSnapshot::capture(
            "Assets/m.mat",
            &MaterialSettings {
                enable_instancing: false,
                cull_mode: Some(0),
            },
        )));
        doc
    }

    #[test]
    fn test_file_storage_missing_file_reads_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("backup.json"));
        assert!(storage.read().unwrap().is_none());
    }

    #[test]
    fn test_file_storage_creates_parent_and_leaves_no_temp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ProjectSettings").join("backup.json");
        let mut storage = FileStorage::new(&path);
        storage.write(&sample()).unwrap();

        assert!(path.exists());
        assert!(!dir
            .path()
            .join("ProjectSettings")
            .join("backup.json.tmp")
            .exists());
        assert_eq!(storage.read().unwrap(), Some(sample()));
    }

    #[test]
    fn test_file_storage_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(FileStorage::new(&path).read().is_err());
    }

    #[test]
    fn test_memory_storage_shares_state_between_clones() {
        let handle = MemoryStorage::new();
        let mut storage = handle.clone();
        storage.write(&sample()).unwrap();

        assert_eq!(handle.write_count(), 1);
        assert_eq!(handle.document(), Some(sample()));

        handle.set_fail_writes(true);
        assert!(storage.write(&sample()).is_err());
        assert_eq!(handle.write_count(), 1);

        handle.set_fail_reads(true);
        assert!(storage.read().is_err());
    }
}

//! Keyed snapshot store with deferred persistence
//!
//! The store keeps at most one snapshot per `(kind, path)`. The first capture
//! wins because it holds the state to restore to. Every capture is flushed to
//! storage right away unless a transaction is open, in which case the write is
//! deferred to the commit. Batching only changes when data reaches storage,
//! never what the store holds, and a crash inside a transaction loses the
//! deferred writes.

use crate::snapshot::{
    AudioSnapshot, LightSnapshot, LightingSnapshot, MaterialSnapshot, PropertySnapshot,
    ResourceKind, SnapshotDocument, TextureSnapshot,
};
use crate::storage::{FileStorage, SnapshotStorage};
use sceneopt_core::{
    AudioSettings, Light, LightingSettings, MaterialSettings, Result, SceneHost, TextureSettings,
};
use std::collections::HashSet;
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// One snapshot that could not be written back
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreFailure {
    pub kind: ResourceKind,
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for RestoreFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to restore {} '{}': {}", self.kind, self.path, self.message)
    }
}

/// Outcome of [`SnapshotStore::restore_all`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreReport {
    pub restored: usize,
    pub failures: Vec<RestoreFailure>,
    /// Set when the host failed to persist pending changes after restoring
    pub save_error: Option<String>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.save_error.is_none()
    }
}

pub struct SnapshotStore {
    storage: Box<dyn SnapshotStorage>,
    document: SnapshotDocument,
    index: HashSet<(ResourceKind, String)>,
    transaction_active: bool,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("document", &self.document)
            .field("transaction_active", &self.transaction_active)
            .finish_non_exhaustive()
    }
}

impl SnapshotStore {
    /// Load the store from `storage`
    ///
    /// A storage that cannot be read leaves the store empty. Optimizations
    /// still run; only the lost entries can no longer be reverted.
    pub fn open(storage: impl SnapshotStorage + 'static) -> Self {
        let document = match storage.read() {
            Ok(Some(document)) => document,
            Ok(None) => SnapshotDocument::default(),
            Err(e) => {
                log::warn!("could not read snapshot document, starting empty: {e}");
                SnapshotDocument::default()
            }
        };
        let mut store = Self {
            storage: Box::new(storage),
            document: SnapshotDocument::default(),
            index: HashSet::new(),
            transaction_active: false,
        };
        store.replace_document(document);
        store
    }

    pub fn open_file<P: AsRef<Path>>(path: P) -> Self {
        Self::open(FileStorage::new(path))
    }

    /// Record `snapshot` unless one already exists for its kind and path
    ///
    /// Returns `true` when the snapshot was stored. An empty path is ignored.
    pub fn capture(&mut self, snapshot: impl Into<PropertySnapshot>) -> bool {
        let snapshot = snapshot.into();
        if snapshot.path().is_empty() {
            return false;
        }
        let key = (snapshot.kind(), snapshot.path().to_string());
        if self.index.contains(&key) {
            return false;
        }
        log::debug!("captured {} '{}'", key.0, key.1);
        self.index.insert(key);
        self.document.push(snapshot);
        if !self.transaction_active {
            self.flush();
        }
        true
    }

    pub fn capture_texture(&mut self, path: &str, settings: &TextureSettings) -> bool {
        self.capture(TextureSnapshot::capture(path, settings))
    }

    pub fn capture_audio(&mut self, path: &str, settings: &AudioSettings) -> bool {
        self.capture(AudioSnapshot::capture(path, settings))
    }

    pub fn capture_material(&mut self, path: &str, settings: &MaterialSettings) -> bool {
        self.capture(MaterialSnapshot::capture(path, settings))
    }

    pub fn capture_lighting(&mut self, path: &str, settings: &LightingSettings) -> bool {
        self.capture(LightingSnapshot::capture(path, settings))
    }

    /// `node_path` is the light's [`SceneGraph::path_of`](sceneopt_core::SceneGraph::path_of)
    pub fn capture_light(&mut self, node_path: &str, light: &Light) -> bool {
        self.capture(LightSnapshot::capture(node_path, light))
    }

    pub fn contains(&self, kind: ResourceKind, path: &str) -> bool {
        self.index.contains(&(kind, path.to_string()))
    }

    pub fn texture(&self, path: &str) -> Option<&TextureSnapshot> {
        self.document.textures.iter().find(|s| s.path == path)
    }

    pub fn audio(&self, path: &str) -> Option<&AudioSnapshot> {
        self.document.audios.iter().find(|s| s.path == path)
    }

    pub fn material(&self, path: &str) -> Option<&MaterialSnapshot> {
        self.document.materials.iter().find(|s| s.path == path)
    }

    pub fn lighting(&self, path: &str) -> Option<&LightingSnapshot> {
        self.document.lighting.iter().find(|s| s.path == path)
    }

    pub fn light(&self, node_path: &str) -> Option<&LightSnapshot> {
        self.document.lights.iter().find(|s| s.path == node_path)
    }

    pub fn document(&self) -> &SnapshotDocument {
        &self.document
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn has_backup(&self) -> bool {
        !self.is_empty()
    }

    /// Defer flushes until [`commit_transaction`](Self::commit_transaction)
    ///
    /// Transactions do not nest: beginning while one is open has no effect.
    pub fn begin_transaction(&mut self) {
        if self.transaction_active {
            log::debug!("transaction already active");
        }
        self.transaction_active = true;
    }

    /// Close the transaction and flush, even if nothing was captured
    pub fn commit_transaction(&mut self) {
        self.transaction_active = false;
        self.flush();
    }

    pub fn is_transaction_active(&self) -> bool {
        self.transaction_active
    }

    /// Open a transaction that commits when the guard is dropped
    pub fn transaction(&mut self) -> Transaction<'_> {
        self.begin_transaction();
        Transaction {
            store: self,
            committed: false,
        }
    }

    /// Write the current contents to storage
    ///
    /// A failed write is logged and the in-memory contents stay authoritative,
    /// so a later successful flush still converges.
    pub fn flush(&mut self) {
        if let Err(e) = self.storage.write(&self.document) {
            log::error!("failed to write snapshot document: {e}");
        }
    }

    /// Drop every snapshot and flush the empty store
    pub fn clear(&mut self) {
        self.document = SnapshotDocument::default();
        self.index.clear();
        self.flush();
    }

    /// Write every snapshot back through `host`, then clear the store
    ///
    /// The stored document is re-read first so entries flushed by another
    /// session are restored too. Items that fail are reported and skipped.
    pub fn restore_all<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> RestoreReport {
        self.reload();

        let mut report = RestoreReport::default();
        for snapshot in &self.document.textures {
            let outcome = match host.texture(&snapshot.path) {
                Some(mut settings) => {
                    snapshot.apply_to(&mut settings);
                    host.apply_texture(&snapshot.path, &settings)
                }
                None => Err(not_found(ResourceKind::Texture, &snapshot.path)),
            };
            record(&mut report, ResourceKind::Texture, &snapshot.path, outcome);
        }
        for snapshot in &self.document.audios {
            let outcome = match host.audio(&snapshot.path) {
                Some(mut settings) => {
                    snapshot.apply_to(&mut settings);
                    host.apply_audio(&snapshot.path, &settings)
                }
                None => Err(not_found(ResourceKind::Audio, &snapshot.path)),
            };
            record(&mut report, ResourceKind::Audio, &snapshot.path, outcome);
        }
        for snapshot in &self.document.materials {
            let outcome = match host.material(&snapshot.path) {
                Some(mut settings) => {
                    snapshot.apply_to(&mut settings);
                    host.apply_material(&snapshot.path, &settings)
                }
                None => Err(not_found(ResourceKind::Material, &snapshot.path)),
            };
            record(&mut report, ResourceKind::Material, &snapshot.path, outcome);
        }
        for snapshot in &self.document.lighting {
            let outcome = match host.lighting(&snapshot.path) {
                Some(mut settings) => {
                    snapshot.apply_to(&mut settings);
                    host.apply_lighting(&snapshot.path, &settings)
                }
                None => Err(not_found(ResourceKind::Lighting, &snapshot.path)),
            };
            record(&mut report, ResourceKind::Lighting, &snapshot.path, outcome);
        }
        for snapshot in &self.document.lights {
            let scene = host.scene_mut();
            let light = scene
                .find_by_path(&snapshot.path)
                .and_then(|id| scene.node_mut(id))
                .and_then(|node| node.light_mut());
            let outcome = match light {
                Some(light) => {
                    snapshot.apply_to(light);
                    Ok(())
                }
                None => Err(not_found(ResourceKind::Light, &snapshot.path)),
            };
            record(&mut report, ResourceKind::Light, &snapshot.path, outcome);
        }

        if let Err(e) = host.save_assets() {
            log::error!("failed to save assets after restore: {e}");
            report.save_error = Some(e.to_string());
        }

        self.clear();
        log::info!(
            "restored {} settings, {} failures",
            report.restored,
            report.failures.len()
        );
        report
    }

    /// [`restore_all`](Self::restore_all) reporting each failure to `on_error`
    ///
    /// Returns the number of restored items.
    pub fn restore_all_with<H, F>(&mut self, host: &mut H, mut on_error: F) -> usize
    where
        H: SceneHost + ?Sized,
        F: FnMut(&RestoreFailure),
    {
        let report = self.restore_all(host);
        report.failures.iter().for_each(&mut on_error);
        report.restored
    }

    fn reload(&mut self) {
        let stored = match self.storage.read() {
            Ok(Some(document)) => document,
            Ok(None) => return,
            Err(e) => {
                log::warn!("could not re-read snapshot document, using in-memory copy: {e}");
                return;
            }
        };
        let in_memory = std::mem::replace(&mut self.document, SnapshotDocument::default());
        self.replace_document(stored);

        // Entries captured here but not yet flushed still count
        for snapshot in in_memory.into_snapshots() {
            let key = (snapshot.kind(), snapshot.path().to_string());
            if self.index.insert(key) {
                self.document.push(snapshot);
            }
        }
    }

    fn replace_document(&mut self, document: SnapshotDocument) {
        self.document = SnapshotDocument::default();
        self.index.clear();
        for snapshot in document.into_snapshots() {
            if snapshot.path().is_empty() {
                continue;
            }
            // Duplicates in a hand-edited document: keep the first
            if self
                .index
                .insert((snapshot.kind(), snapshot.path().to_string()))
            {
                self.document.push(snapshot);
            }
        }
    }
}

fn not_found(kind: ResourceKind, path: &str) -> sceneopt_core::Error {
    sceneopt_core::Error::NotFound(format!("{kind} '{path}'"))
}

fn record(report: &mut RestoreReport, kind: ResourceKind, path: &str, outcome: Result<()>) {
    match outcome {
        Ok(()) => report.restored += 1,
        Err(e) => {
            let failure = RestoreFailure {
                kind,
                path: path.to_string(),
                message: e.to_string(),
            };
            log::warn!("{failure}");
            report.failures.push(failure);
        }
    }
}

/// Scoped transaction on a [`SnapshotStore`]
///
/// Dereferences to the store. Dropping the guard commits, so the deferred
/// flush happens on every exit path.
pub struct Transaction<'a> {
    store: &'a mut SnapshotStore,
    committed: bool,
}

impl Transaction<'_> {
    pub fn commit(mut self) {
        self.committed = true;
        self.store.commit_transaction();
    }
}

impl Deref for Transaction<'_> {
    type Target = SnapshotStore;

    fn deref(&self) -> &SnapshotStore {
        self.store
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut SnapshotStore {
        self.store
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.store.commit_transaction();
        }
    }
}

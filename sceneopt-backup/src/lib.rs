//! Snapshot capture and restore for sceneopt
//!
//! Before the optimizer changes an asset it records the settings it is about
//! to touch. This crate provides:
//! - Snapshot types per asset kind and the persisted document
//! - The [`SnapshotStore`] with transactional, deferred flushing
//! - File and in-memory storage backends
//! - Verbatim file copies of source assets

pub mod file_backup;
pub mod snapshot;
pub mod storage;
pub mod store;

pub use file_backup::*;
pub use snapshot::*;
pub use storage::*;
pub use store::*;

/// Default location of the snapshot document, outside the content tree
pub const DEFAULT_SNAPSHOT_PATH: &str = "ProjectSettings/SceneOpt_Backup.json";

#[cfg(test)]
mod tests;

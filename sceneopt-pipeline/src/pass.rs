//! The pass abstraction and what a pass gets to work with

use crate::config::OptimizerConfig;
use crate::stats::OptimizationStats;
use itertools::Itertools;
use sceneopt_backup::{FileBackup, SnapshotStore};
use sceneopt_core::{Component, Result, SceneGraph, SceneHost};

/// Everything a pass may read or change during one run
pub struct PassContext<'a> {
    pub host: &'a mut dyn SceneHost,
    pub store: &'a mut SnapshotStore,
    pub config: &'a OptimizerConfig,
    pub stats: &'a mut OptimizationStats,
    /// Set when file-level backup is enabled
    pub file_backup: Option<&'a FileBackup>,
}

impl PassContext<'_> {
    /// Copy the source file of `path` if file-level backup is on
    pub fn backup_file(&self, path: &str) {
        if let Some(backup) = self.file_backup {
            backup.create_or_warn(path);
        }
    }
}

/// One named, independently toggleable change over the live scene
///
/// A pass captures every asset into the store before changing it and skips
/// assets that already have the desired settings, so running it twice makes
/// no changes the second time.
pub trait OptimizationPass {
    fn name(&self) -> &'static str;

    /// Returns the number of items changed
    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize>;
}

/// Material paths used by renderers of the live scene, first use first
pub fn live_material_paths(scene: &SceneGraph) -> Vec<String> {
    scene
        .live_nodes()
        .into_iter()
        .filter_map(|id| scene.node(id))
        .flat_map(|node| node.components.iter())
        .filter_map(|c| match c {
            Component::Renderer(r) => Some(r.materials.iter().flatten()),
            _ => None,
        })
        .flatten()
        .unique()
        .cloned()
        .collect()
}

/// Audio clip paths played by sources in the live scene, first use first
pub fn live_audio_clips(scene: &SceneGraph) -> Vec<String> {
    scene
        .live_nodes()
        .into_iter()
        .filter_map(|id| scene.node(id))
        .flat_map(|node| node.components.iter())
        .filter_map(|c| match c {
            Component::AudioSource { clip: Some(clip) } if !clip.is_empty() => Some(clip),
            _ => None,
        })
        .unique()
        .cloned()
        .collect()
}

//! Runs passes against a host inside one snapshot transaction
//!
//! The optimizer owns the snapshot store and an ordered list of passes, each
//! with its own enabled flag. A full run resets the statistics, opens a
//! transaction, runs the enabled passes in order, commits and asks the host to
//! persist. A failing pass is logged and does not stop the others.

use crate::config::OptimizerConfig;
use crate::error_log::ErrorLog;
use crate::pass::{OptimizationPass, PassContext};
use crate::passes::{
    default_passes, download_size_audio, download_size_texture, optimize_audio_with,
    optimize_textures_with,
};
use crate::stats::OptimizationStats;
use itertools::Itertools;
use sceneopt_backup::{FileBackup, RestoreReport, SnapshotStore};
use sceneopt_core::{Error, NodeId, Result, SceneGraph, SceneHost};
use sceneopt_simplification::{LodReport, LodSettings, MaterialMerger, MergeReport};
use std::path::Path;

/// Meshes above this many triangles are reported by [`analyze_meshes`]
pub const HEAVY_MESH_TRIANGLES: usize = 1000;
pub const HEAVY_MESH_LIMIT: usize = 10;

struct PassEntry {
    pass: Box<dyn OptimizationPass>,
    enabled: bool,
}

/// Result of one pass within a run
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    pub name: &'static str,
    /// Changed item count, or the failure message
    pub result: std::result::Result<usize, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<PassOutcome>,
    /// Set when the host failed to persist after the run
    pub save_error: Option<String>,
}

impl RunReport {
    pub fn changed(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &PassOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }
}

/// A live renderer with an expensive mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeavyMesh {
    pub node: NodeId,
    pub name: String,
    pub triangles: usize,
}

pub struct Optimizer {
    config: OptimizerConfig,
    store: SnapshotStore,
    passes: Vec<PassEntry>,
    stats: OptimizationStats,
    file_backup: Option<FileBackup>,
    error_log: ErrorLog,
}

impl Optimizer {
    /// Optimizer with the built-in passes toggled as `config` says
    pub fn new(config: OptimizerConfig, store: SnapshotStore) -> Self {
        let passes = default_passes(&config.passes)
            .into_iter()
            .map(|(pass, enabled)| PassEntry { pass, enabled })
            .collect();
        let error_log = ErrorLog::new(config.error_log.clone());
        Self {
            config,
            store,
            passes,
            stats: OptimizationStats::default(),
            file_backup: None,
            error_log,
        }
    }

    /// Optimizer for the project rooted at `project_root`
    ///
    /// The snapshot document, backup directory and error log paths of
    /// `config` are resolved against the root.
    pub fn open<P: AsRef<Path>>(config: OptimizerConfig, project_root: P) -> Self {
        let root = project_root.as_ref();
        let store = SnapshotStore::open_file(root.join(&config.snapshot_path));
        let file_backup = config
            .file_backup
            .then(|| FileBackup::new(root, &config.backup_dir));
        let error_log = ErrorLog::new(config.error_log.as_ref().map(|p| root.join(p)));

        let mut optimizer = Self::new(config, store);
        optimizer.file_backup = file_backup;
        optimizer.error_log = error_log;
        optimizer
    }

    pub fn with_file_backup(mut self, backup: FileBackup) -> Self {
        self.file_backup = Some(backup);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SnapshotStore {
        &mut self.store
    }

    /// Counters of the most recent run
    pub fn stats(&self) -> &OptimizationStats {
        &self.stats
    }

    /// Append a pass after the existing ones
    pub fn add_pass(&mut self, pass: Box<dyn OptimizationPass>, enabled: bool) {
        self.passes.push(PassEntry { pass, enabled });
    }

    /// Pass names in run order with their enabled flags
    pub fn passes(&self) -> Vec<(&'static str, bool)> {
        self.passes
            .iter()
            .map(|e| (e.pass.name(), e.enabled))
            .collect()
    }

    pub fn set_pass_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let entry = self
            .passes
            .iter_mut()
            .find(|e| e.pass.name() == name)
            .ok_or_else(|| Error::NotFound(format!("pass '{name}'")))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Run every enabled pass in one transaction, then persist
    pub fn run_all(&mut self, host: &mut dyn SceneHost) -> RunReport {
        self.stats.reset();
        let mut report = RunReport::default();
        {
            let Self {
                config,
                store,
                passes,
                stats,
                file_backup,
                error_log,
            } = self;
            let mut tx = store.transaction();
            for entry in passes.iter().filter(|e| e.enabled) {
                let name = entry.pass.name();
                let mut ctx = PassContext {
                    host: &mut *host,
                    store: &mut *tx,
                    config: &*config,
                    stats: &mut *stats,
                    file_backup: file_backup.as_ref(),
                };
                let result = entry.pass.run(&mut ctx).map_err(|e| {
                    let message = format!("pass '{name}' failed: {e}");
                    error_log.record(&message);
                    message
                });
                report.outcomes.push(PassOutcome { name, result });
            }
            tx.commit();
        }
        report.save_error = self.save_assets(host);
        log::info!("{}", self.stats);
        report
    }

    /// Run one pass by name, whether or not it is enabled
    ///
    /// Only an unknown name is an error; a failing pass is reported in the
    /// outcome like in [`run_all`](Self::run_all).
    pub fn run_pass(&mut self, host: &mut dyn SceneHost, name: &str) -> Result<RunReport> {
        let index = self
            .passes
            .iter()
            .position(|e| e.pass.name() == name)
            .ok_or_else(|| Error::NotFound(format!("pass '{name}'")))?;
        self.stats.reset();

        let mut report = RunReport::default();
        {
            let Self {
                config,
                store,
                passes,
                stats,
                file_backup,
                error_log,
            } = self;
            let mut tx = store.transaction();
            let mut ctx = PassContext {
                host: &mut *host,
                store: &mut *tx,
                config: &*config,
                stats: &mut *stats,
                file_backup: file_backup.as_ref(),
            };
            let entry = &passes[index];
            let result = entry.pass.run(&mut ctx).map_err(|e| {
                let message = format!("pass '{name}' failed: {e}");
                error_log.record(&message);
                message
            });
            report.outcomes.push(PassOutcome {
                name: entry.pass.name(),
                result,
            });
        }
        report.save_error = self.save_assets(host);
        Ok(report)
    }

    /// Put every captured setting back and empty the store
    pub fn revert(&mut self, host: &mut dyn SceneHost) -> RestoreReport {
        let report = self.store.restore_all(host);
        if let Some(e) = &report.save_error {
            self.error_log
                .record(&format!("failed to save assets after revert: {e}"));
        }
        report
    }

    /// Aggressive texture and audio settings for the smallest download
    ///
    /// Covers every texture and audio clip the scene depends on. The report
    /// has one outcome for textures and one for audio.
    pub fn optimize_for_download_size(&mut self, host: &mut dyn SceneHost) -> RunReport {
        self.stats.reset();
        let mut report = RunReport::default();
        {
            let Self {
                config,
                store,
                stats,
                file_backup,
                ..
            } = self;
            let mut tx = store.transaction();
            let mut ctx = PassContext {
                host: &mut *host,
                store: &mut *tx,
                config: &*config,
                stats: &mut *stats,
                file_backup: file_backup.as_ref(),
            };
            let textures = optimize_textures_with(&mut ctx, download_size_texture);
            let dependencies = ctx.host.scene_dependencies();
            let audio = optimize_audio_with(&mut ctx, dependencies, download_size_audio);
            report.outcomes = vec![
                PassOutcome {
                    name: "download-textures",
                    result: Ok(textures),
                },
                PassOutcome {
                    name: "download-audio",
                    result: Ok(audio),
                },
            ];
        }
        report.save_error = self.save_assets(host);
        log::info!(
            "applied download size settings to {} assets",
            report.changed()
        );
        report
    }

    /// Merge primitives below `root` that share a material
    ///
    /// Scene edits are not captured; re-enabling the source renderers and
    /// removing the combined nodes undoes a merge.
    pub fn merge_meshes(&mut self, host: &mut dyn SceneHost, root: NodeId) -> Result<MergeReport> {
        MaterialMerger::new().merge(host.scene_mut(), root)
    }

    pub fn generate_lods(
        &mut self,
        host: &mut dyn SceneHost,
        target: NodeId,
        settings: &LodSettings,
    ) -> Result<LodReport> {
        sceneopt_simplification::generate_lods(host.scene_mut(), target, settings)
    }

    fn save_assets(&self, host: &mut dyn SceneHost) -> Option<String> {
        host.save_assets().err().map(|e| {
            let message = format!("failed to save assets: {e}");
            self.error_log.record(&message);
            message
        })
    }
}

/// The heaviest meshes drawn in the live scene, most triangles first
pub fn analyze_meshes(scene: &SceneGraph) -> Vec<HeavyMesh> {
    scene
        .live_nodes()
        .into_iter()
        .filter_map(|id| {
            let node = scene.node(id)?;
            let mesh = node.renderer()?.mesh.as_ref()?;
            let triangles = mesh.face_count();
            (triangles > HEAVY_MESH_TRIANGLES).then(|| HeavyMesh {
                node: id,
                name: node.name.clone(),
                triangles,
            })
        })
        .sorted_by(|a, b| b.triangles.cmp(&a.triangles))
        .take(HEAVY_MESH_LIMIT)
        .collect()
}

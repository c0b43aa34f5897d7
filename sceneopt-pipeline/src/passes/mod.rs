//! Built-in optimization passes

pub mod audio;
pub mod culling;
pub mod instancing;
pub mod lighting;
pub mod missing_components;
pub mod static_flags;
pub mod textures;

pub use audio::*;
pub use culling::*;
pub use instancing::*;
pub use lighting::*;
pub use missing_components::*;
pub use static_flags::*;
pub use textures::*;

use crate::config::PassToggles;
use crate::pass::OptimizationPass;

/// The built-in passes in run order, each with its enabled flag from `toggles`
pub fn default_passes(toggles: &PassToggles) -> Vec<(Box<dyn OptimizationPass>, bool)> {
    vec![
        (Box::new(RemoveMissingComponents), toggles.remove_missing),
        (Box::new(EnableGpuInstancing), toggles.gpu_instancing),
        (Box::new(OptimizeTextures), toggles.textures),
        (Box::new(OptimizeAudio), toggles.audio),
        (Box::new(SetStaticFlags), toggles.static_flags),
        (Box::new(ForceBackfaceCulling), toggles.backface_culling),
        (Box::new(OptimizeLighting), toggles.lighting),
        (Box::new(BakeAllLights), toggles.baked_lights),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::OptimizerConfig;
    use crate::pass::{OptimizationPass, PassContext};
    use crate::stats::OptimizationStats;
    use sceneopt_backup::{MemoryStorage, SnapshotStore};
    use sceneopt_core::{Component, MeshRenderer, Project, SceneGraph, TriangleMesh};

    pub fn store() -> SnapshotStore {
        SnapshotStore::open(MemoryStorage::new())
    }

    /// Run `pass` once against `project`, returning the change count and stats
    pub fn run(
        pass: &dyn OptimizationPass,
        project: &mut Project,
        store: &mut SnapshotStore,
        config: &OptimizerConfig,
    ) -> (usize, OptimizationStats) {
        let mut stats = OptimizationStats::default();
        let changed = {
            let mut ctx = PassContext {
                host: project,
                store,
                config,
                stats: &mut stats,
                file_backup: None,
            };
            pass.run(&mut ctx).unwrap()
        };
        (changed, stats)
    }

    pub fn add_renderer(scene: &mut SceneGraph, name: &str, material: &str) {
        let id = scene.add_root(name);
        scene
            .node_mut(id)
            .unwrap()
            .components
            .push(Component::Renderer(MeshRenderer::new(
                TriangleMesh::new(),
                material,
            )));
    }
}

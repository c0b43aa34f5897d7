use crate::pass::{live_material_paths, OptimizationPass, PassContext};
use sceneopt_core::{cull_mode, Result};

/// Switches double sided materials to back-face culling
#[derive(Debug, Clone, Copy, Default)]
pub struct ForceBackfaceCulling;

impl OptimizationPass for ForceBackfaceCulling {
    fn name(&self) -> &'static str {
        "backface-culling"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let mut count = 0;
        for path in live_material_paths(ctx.host.scene()) {
            let Some(settings) = ctx.host.material(&path) else {
                continue;
            };
            if settings.cull_mode != Some(cull_mode::OFF) {
                continue;
            }
            ctx.store.capture_material(&path, &settings);
            let mut updated = settings;
            updated.cull_mode = Some(cull_mode::BACK);
            match ctx.host.apply_material(&path, &updated) {
                Ok(()) => count += 1,
                Err(e) => log::warn!("could not change culling of '{path}': {e}"),
            }
        }
        ctx.stats.materials_culled += count;
        log::info!("forced back-face culling on {count} materials");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;
    use crate::passes::testing;
    use sceneopt_core::{AssetDatabase, MaterialSettings, Project};

    #[test]
    fn test_only_double_sided_materials_change() {
        let mut project = Project::new();
        for (path, cull) in [
            ("Assets/double.mat", Some(cull_mode::OFF)),
            ("Assets/front.mat", Some(cull_mode::FRONT)),
            ("Assets/unlit.mat", None),
        ] {
            project.materials.insert(
                path.to_string(),
                MaterialSettings {
                    enable_instancing: false,
                    cull_mode: cull,
                },
            );
            testing::add_renderer(&mut project.scene, path, path);
        }

        let mut store = testing::store();
        let config = OptimizerConfig::default();
        let (count, stats) = testing::run(&ForceBackfaceCulling, &mut project, &mut store, &config);

        assert_eq!(count, 1);
        assert_eq!(stats.materials_culled, 1);
        assert_eq!(
            project.material("Assets/double.mat").unwrap().cull_mode,
            Some(cull_mode::BACK)
        );
        assert_eq!(
            project.material("Assets/front.mat").unwrap().cull_mode,
            Some(cull_mode::FRONT)
        );
        assert_eq!(store.material("Assets/double.mat").unwrap().cull_mode, 0);

        // Restoring puts the double sided mode back
        let report = store.restore_all(&mut project);
        assert_eq!(report.restored, 1);
        assert_eq!(
            project.material("Assets/double.mat").unwrap().cull_mode,
            Some(cull_mode::OFF)
        );
    }
}

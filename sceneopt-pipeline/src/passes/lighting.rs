//! Lightmap settings and light bake modes

use crate::config::LightmapTarget;
use crate::pass::{OptimizationPass, PassContext};
use sceneopt_core::{GiWorkflow, LightBakeType, LightingSettings, Result};

/// `current` with the lightmap parameters of `target` applied
///
/// Global illumination is switched to on-demand baking so editing the scene
/// no longer triggers bakes.
pub fn optimized_lighting(current: &LightingSettings, target: &LightmapTarget) -> LightingSettings {
    let mut settings = current.clone();
    settings.gi_workflow = GiWorkflow::OnDemand;
    settings.lightmap_max_size = target.max_size;
    settings.direct_sample_count = target.direct_sample_count;
    if let Some(compression) = target.compression {
        settings.lightmap_compression = compression;
    }
    settings
}

/// Applies the profile's lightmap parameters to the scene's lighting settings
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeLighting;

impl OptimizationPass for OptimizeLighting {
    fn name(&self) -> &'static str {
        "lighting"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let Some(path) = ctx.host.scene_lighting_path() else {
            log::info!("scene has no lighting settings asset, skipping");
            return Ok(0);
        };
        let Some(current) = ctx.host.lighting(&path) else {
            log::warn!("lighting settings '{path}' not found");
            return Ok(0);
        };
        let updated = optimized_lighting(&current, &ctx.config.lightmap_target());
        if updated == current {
            return Ok(0);
        }
        ctx.store.capture_lighting(&path, &current);
        ctx.host.apply_lighting(&path, &updated)?;
        ctx.stats.lighting_settings_changed += 1;
        log::info!(
            "lightmaps set to {} texels, {} direct samples",
            updated.lightmap_max_size,
            updated.direct_sample_count
        );
        Ok(1)
    }
}

/// Switches every light of the live scene to baked
#[derive(Debug, Clone, Copy, Default)]
pub struct BakeAllLights;

impl OptimizationPass for BakeAllLights {
    fn name(&self) -> &'static str {
        "baked-lights"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let scene = ctx.host.scene();
        let pending: Vec<_> = scene
            .live_nodes()
            .into_iter()
            .filter(|&id| {
                scene
                    .node(id)
                    .and_then(|node| node.light())
                    .is_some_and(|light| light.bake_type != LightBakeType::Baked)
            })
            .collect();

        let mut count = 0;
        for id in pending {
            let path = ctx.host.scene().path_of(id)?;
            let Some(light) = ctx.host.scene_mut().get_mut(id)?.light_mut() else {
                continue;
            };
            ctx.store.capture_light(&path, light);
            light.bake_type = LightBakeType::Baked;
            count += 1;
        }
        ctx.stats.lights_baked += count;
        log::info!("set {count} lights to baked");
        Ok(count)
    }
}

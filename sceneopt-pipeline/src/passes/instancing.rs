use crate::pass::{live_material_paths, OptimizationPass, PassContext};
use sceneopt_core::Result;

/// Turns on GPU instancing for every material drawn in the live scene
#[derive(Debug, Clone, Copy, Default)]
pub struct EnableGpuInstancing;

impl OptimizationPass for EnableGpuInstancing {
    fn name(&self) -> &'static str {
        "gpu-instancing"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let mut count = 0;
        for path in live_material_paths(ctx.host.scene()) {
            let Some(settings) = ctx.host.material(&path) else {
                log::warn!("material '{path}' not found, skipping");
                continue;
            };
            if settings.enable_instancing {
                continue;
            }
            ctx.store.capture_material(&path, &settings);
            let mut updated = settings;
            updated.enable_instancing = true;
            match ctx.host.apply_material(&path, &updated) {
                Ok(()) => count += 1,
                Err(e) => log::warn!("could not enable instancing on '{path}': {e}"),
            }
        }
        ctx.stats.materials_instanced += count;
        log::info!("enabled GPU instancing on {count} materials");
        Ok(count)
    }
}

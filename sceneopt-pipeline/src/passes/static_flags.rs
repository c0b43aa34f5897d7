use crate::pass::{OptimizationPass, PassContext};
use sceneopt_core::{Result, StaticFlags};

/// Flags set on every node that has a collider but no rigidbody
pub const STATIC_GEOMETRY_FLAGS: StaticFlags = StaticFlags::BATCHING
    .union(StaticFlags::OCCLUDEE)
    .union(StaticFlags::OCCLUDER)
    .union(StaticFlags::REFLECTION_PROBE);

/// Marks immovable collision geometry static
///
/// Static flags live on scene nodes, not assets, and are left out of the
/// snapshot store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetStaticFlags;

impl OptimizationPass for SetStaticFlags {
    fn name(&self) -> &'static str {
        "static-flags"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let scene = ctx.host.scene_mut();
        let mut count = 0;
        for id in scene.live_nodes() {
            let node = scene.get_mut(id)?;
            if !node.has_collider() || node.has_rigidbody() {
                continue;
            }
            if node.static_flags.contains(STATIC_GEOMETRY_FLAGS) {
                continue;
            }
            node.static_flags.insert(STATIC_GEOMETRY_FLAGS);
            count += 1;
        }
        ctx.stats.static_flags_set += count;
        log::info!("set static flags on {count} objects");
        Ok(count)
    }
}

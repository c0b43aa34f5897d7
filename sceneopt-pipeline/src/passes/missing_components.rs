use crate::pass::{OptimizationPass, PassContext};
use sceneopt_core::{Component, Result};

/// Strips components whose type can no longer be resolved
///
/// Broken references carry no settings worth restoring, so nothing is
/// captured before removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveMissingComponents;

impl OptimizationPass for RemoveMissingComponents {
    fn name(&self) -> &'static str {
        "remove-missing"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let scene = ctx.host.scene_mut();
        let mut removed = 0;
        for id in scene.live_nodes() {
            let node = scene.get_mut(id)?;
            let count = node.missing_component_count();
            if count > 0 {
                node.components.retain(|c| !matches!(c, Component::Missing));
                log::debug!("removed {count} missing components from '{}'", node.name);
                removed += count;
            }
        }
        ctx.stats.missing_components_removed += removed;
        log::info!("removed {removed} missing components");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;
    use crate::passes::testing;
    use sceneopt_core::Project;

    #[test]
    fn test_removes_from_live_nodes_only() {
        let mut project = Project::new();
        let level = project.scene.add_root("Level");
        let child = project.scene.add_child(level, "Lamp").unwrap();
        project.scene.node_mut(child).unwrap().active = false;
        project.scene.node_mut(child).unwrap().components =
            vec![Component::Missing, Component::Collider, Component::Missing];
        let asset = project.scene.add_root("Prefab");
        project.scene.node_mut(asset).unwrap().persistent = true;
        project.scene.node_mut(asset).unwrap().components = vec![Component::Missing];

        let mut store = testing::store();
        let config = OptimizerConfig::default();
        let (removed, stats) =
            testing::run(&RemoveMissingComponents, &mut project, &mut store, &config);

        assert_eq!(removed, 2);
        assert_eq!(stats.missing_components_removed, 2);
        assert_eq!(
            project.scene.node(child).unwrap().components,
            vec![Component::Collider]
        );
        assert_eq!(project.scene.node(asset).unwrap().missing_component_count(), 1);

        let (again, _) = testing::run(&RemoveMissingComponents, &mut project, &mut store, &config);
        assert_eq!(again, 0);
    }
}

//! Optimize on entering play mode, revert on leaving it

use crate::config::OptimizerConfig;
use crate::orchestrator::{Optimizer, RunReport};
use sceneopt_backup::RestoreReport;
use sceneopt_core::SceneHost;

#[derive(Debug, Clone, Default)]
pub struct AutoOptimizeSession {
    enabled: bool,
    revert_pending: bool,
}

impl AutoOptimizeSession {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            revert_pending: false,
        }
    }

    /// Enabled when `auto_optimize_on_play` is set
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self::new(config.auto_optimize_on_play)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn revert_pending(&self) -> bool {
        self.revert_pending
    }

    /// Run all passes if enabled; the next exit will revert them
    pub fn on_enter_play(
        &mut self,
        optimizer: &mut Optimizer,
        host: &mut dyn SceneHost,
    ) -> Option<RunReport> {
        if !self.enabled {
            return None;
        }
        log::info!("auto-optimizing before play");
        let report = optimizer.run_all(host);
        self.revert_pending = true;
        Some(report)
    }

    /// Revert what [`on_enter_play`](Self::on_enter_play) changed
    pub fn on_exit_play(
        &mut self,
        optimizer: &mut Optimizer,
        host: &mut dyn SceneHost,
    ) -> Option<RestoreReport> {
        if !std::mem::take(&mut self.revert_pending) {
            return None;
        }
        if !optimizer.store().has_backup() {
            return None;
        }
        log::info!("reverting auto-optimization");
        Some(optimizer.revert(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneopt_backup::{MemoryStorage, SnapshotStore};
    use tempfile::tempdir;
    use sceneopt_core::{AssetDatabase, Component, Project, TextureSettings};

    fn setup() -> (Optimizer, Project) {
        let optimizer = Optimizer::new(
            OptimizerConfig::default(),
            SnapshotStore::open(MemoryStorage::new()),
        );
        let mut project = Project::new();
        project.textures.insert(
            "Assets/sky.png".to_string(),
            TextureSettings {
                max_texture_size: 8192,
                ..Default::default()
            },
        );
        project.dependencies = vec!["Assets/sky.png".to_string()];
        let id = project.scene.add_root("Ground");
        project.scene.node_mut(id).unwrap().components = vec![Component::Collider];
        (optimizer, project)
    }

    #[test]
    fn test_round_trip_through_play_mode() {
        let (mut optimizer, mut project) = setup();
        let mut session = AutoOptimizeSession::new(true);

        let run = session.on_enter_play(&mut optimizer, &mut project).unwrap();
        assert!(run.changed() > 0);
        assert!(session.revert_pending());
        assert_eq!(project.texture("Assets/sky.png").unwrap().max_texture_size, 2048);

        let restore = session.on_exit_play(&mut optimizer, &mut project).unwrap();
        assert_eq!(restore.restored, 1);
        assert_eq!(project.texture("Assets/sky.png").unwrap().max_texture_size, 8192);
        assert!(!session.revert_pending());
        assert!(session.on_exit_play(&mut optimizer, &mut project).is_none());
    }

    #[test]
    fn test_session_enabled_from_loaded_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sceneopt.json");
        std::fs::write(&path, r#"{ "auto_optimize_on_play": true }"#).unwrap();
        let config = OptimizerConfig::load(&path).unwrap();

        let (mut optimizer, mut project) = setup();
        let mut session = AutoOptimizeSession::from_config(&config);
        assert!(session.is_enabled());
        assert!(session.on_enter_play(&mut optimizer, &mut project).is_some());
        assert_eq!(project.texture("Assets/sky.png").unwrap().max_texture_size, 2048);
        assert!(session.on_exit_play(&mut optimizer, &mut project).is_some());

        assert!(!AutoOptimizeSession::from_config(&OptimizerConfig::default()).is_enabled());
    }

    #[test]
    fn test_disabled_session_does_nothing() {
        let (mut optimizer, mut project) = setup();
        let mut session = AutoOptimizeSession::default();
        assert!(session.on_enter_play(&mut optimizer, &mut project).is_none());
        assert!(session.on_exit_play(&mut optimizer, &mut project).is_none());
        assert_eq!(project.texture("Assets/sky.png").unwrap().max_texture_size, 8192);
    }
}

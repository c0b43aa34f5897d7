//! Integration tests for sceneopt-pipeline
//!
//! These drive the optimizer end to end against an in-memory project:
//! optimize, re-run, revert, and the scene-editing helpers.

use sceneopt_backup::{FileBackup, MemoryStorage, SnapshotStore};
use sceneopt_core::{
    AssetDatabase, AudioSettings, Component, Light, LightBakeType, LightingSettings,
    MaterialSettings, MeshRenderer, NodeId, Point3f, Project, SceneHost, TextureSettings,
    TextureType, Transform3D, TriangleMesh, Vector3f,
};
use sceneopt_pipeline::*;
use std::fs;
use tempfile::tempdir;

fn quad() -> TriangleMesh {
    TriangleMesh::from_vertices_and_faces(
        vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
}

/// A small level: textured props, a speaker, some colliders and a broken component
fn create_level() -> Project {
    let mut project = Project::new();
    project.textures.insert(
        "Assets/Textures/albedo.png".to_string(),
        TextureSettings {
            max_texture_size: 4096,
            source_size: 4096,
            ..Default::default()
        },
    );
    project.textures.insert(
        "Assets/Textures/normal.png".to_string(),
        TextureSettings {
            texture_type: TextureType::NormalMap,
            max_texture_size: 2048,
            ..Default::default()
        },
    );
    project.textures.insert(
        "Assets/UI/button.png".to_string(),
        TextureSettings {
            texture_type: TextureType::Gui,
            max_texture_size: 512,
            ..Default::default()
        },
    );
    project
        .audio
        .insert("Assets/Audio/ambience.wav".to_string(), AudioSettings::default());
    project.materials.insert(
        "Assets/Materials/prop.mat".to_string(),
        MaterialSettings {
            enable_instancing: false,
            cull_mode: Some(0),
        },
    );
    project.dependencies = vec![
        "Assets/Textures/albedo.png".to_string(),
        "Assets/Textures/normal.png".to_string(),
        "Assets/UI/button.png".to_string(),
    ];

    let level = project.scene.add_root("Level");
    for i in 0..3 {
        let prop = project.scene.add_child(level, format!("Prop{i}")).unwrap();
        let node = project.scene.node_mut(prop).unwrap();
        node.local = Transform3D::translation(Vector3f::new(i as f32 * 2.0, 0.0, 0.0));
        node.components = vec![
            Component::Renderer(MeshRenderer::new(quad(), "Assets/Materials/prop.mat")),
            Component::Collider,
        ];
    }
    let speaker = project.scene.add_child(level, "Speaker").unwrap();
    project.scene.node_mut(speaker).unwrap().components = vec![
        Component::AudioSource {
            clip: Some("Assets/Audio/ambience.wav".to_string()),
        },
        Component::Missing,
    ];
    project
}

#[test]
fn test_second_run_changes_nothing() {
    let storage = MemoryStorage::new();
    let mut optimizer = Optimizer::new(
        OptimizerConfig::default(),
        SnapshotStore::open(storage.clone()),
    );
    let mut project = create_level();

    let first = optimizer.run_all(&mut project);
    assert!(first.failures().next().is_none());
    assert!(first.changed() > 0);
    let applies = project.applies();
    let captured = optimizer.store().len();
    let writes = storage.write_count();
    assert_eq!(writes, 1);

    let second = optimizer.run_all(&mut project);
    assert_eq!(second.changed(), 0);
    assert_eq!(project.applies(), applies);
    assert_eq!(optimizer.store().len(), captured);
    assert_eq!(optimizer.stats().total_changes(), 0);
}

#[test]
fn test_run_then_revert_restores_everything() {
    let original = create_level();
    let mut project = original.clone();
    let mut optimizer = Optimizer::new(
        OptimizerConfig::default(),
        SnapshotStore::open(MemoryStorage::new()),
    );

    optimizer.run_all(&mut project);
    let stats = optimizer.stats().clone();
    assert_eq!(stats.missing_components_removed, 1);
    assert_eq!(stats.materials_instanced, 1);
    assert_eq!(stats.textures_optimized, 2);
    assert_eq!(stats.audio_optimized, 1);
    assert_eq!(stats.static_flags_set, 3);
    assert_eq!(stats.materials_culled, 0);
    assert!(stats.texture_bytes_saved > 0);

    let albedo = project.texture("Assets/Textures/albedo.png").unwrap();
    assert_eq!(albedo.max_texture_size, 2048);
    assert!(albedo.crunched_compression);
    let normal = project.texture("Assets/Textures/normal.png").unwrap();
    assert!(!normal.crunched_compression);
    assert!(normal.streaming_mipmaps);
    assert_eq!(
        project.texture("Assets/UI/button.png").unwrap(),
        original.texture("Assets/UI/button.png").unwrap()
    );

    let report = optimizer.revert(&mut project);
    assert!(report.is_clean());
    assert_eq!(report.restored, 4);
    assert!(!optimizer.store().has_backup());
    for path in ["Assets/Textures/albedo.png", "Assets/Textures/normal.png"] {
        assert_eq!(project.texture(path), original.texture(path));
    }
    assert_eq!(
        project.audio("Assets/Audio/ambience.wav"),
        original.audio("Assets/Audio/ambience.wav")
    );
    assert_eq!(
        project.material("Assets/Materials/prop.mat"),
        original.material("Assets/Materials/prop.mat")
    );
}

#[test]
fn test_snapshots_survive_a_restart() {
    let dir = tempdir().unwrap();
    let mut project = create_level();
    let original = project.clone();

    {
        let mut optimizer = Optimizer::open(OptimizerConfig::default(), dir.path());
        optimizer.run_all(&mut project);
    }
    assert!(dir
        .path()
        .join("ProjectSettings/SceneOpt_Backup.json")
        .exists());

    let mut optimizer = Optimizer::open(OptimizerConfig::default(), dir.path());
    assert!(optimizer.store().has_backup());
    let report = optimizer.revert(&mut project);
    assert_eq!(report.restored, 4);
    assert_eq!(
        project.texture("Assets/Textures/albedo.png"),
        original.texture("Assets/Textures/albedo.png")
    );
}

#[test]
fn test_backface_culling_when_enabled() {
    let mut config = OptimizerConfig::default();
    config.passes.backface_culling = true;
    let mut optimizer = Optimizer::new(config, SnapshotStore::open(MemoryStorage::new()));
    let mut project = create_level();

    optimizer.run_all(&mut project);
    let material = project.material("Assets/Materials/prop.mat").unwrap();
    assert!(material.enable_instancing);
    assert_eq!(material.cull_mode, Some(2));
    assert_eq!(optimizer.stats().materials_culled, 1);

    // Instancing captured the material first, so the snapshot holds both originals
    optimizer.revert(&mut project);
    let material = project.material("Assets/Materials/prop.mat").unwrap();
    assert!(!material.enable_instancing);
    assert_eq!(material.cull_mode, Some(0));
}

#[test]
fn test_lighting_passes_revert_with_the_rest() {
    const LIGHTING: &str = "Assets/Scenes/Level_Lighting.asset";
    let mut project = create_level();
    project
        .lighting
        .insert(LIGHTING.to_string(), LightingSettings::default());
    project.scene_lighting = Some(LIGHTING.to_string());
    let level = project.scene.find_by_name("Level").unwrap();
    let sun = project.scene.add_child(level, "Sun").unwrap();
    project.scene.node_mut(sun).unwrap().components = vec![Component::Light(Light::default())];

    let mut config = OptimizerConfig::default();
    config.passes.lighting = true;
    config.passes.baked_lights = true;
    let mut optimizer = Optimizer::new(config, SnapshotStore::open(MemoryStorage::new()));

    let report = optimizer.run_all(&mut project);
    assert!(report.failures().next().is_none());
    assert_eq!(optimizer.stats().lighting_settings_changed, 1);
    assert_eq!(optimizer.stats().lights_baked, 1);
    assert_eq!(project.lighting(LIGHTING).unwrap().lightmap_max_size, 2048);
    assert!(optimizer.store().light("Level/Sun").is_some());

    let restore = optimizer.revert(&mut project);
    assert!(restore.is_clean());
    assert_eq!(project.lighting(LIGHTING).unwrap(), LightingSettings::default());
    assert_eq!(
        project.scene().get(sun).unwrap().light().unwrap().bake_type,
        LightBakeType::Realtime
    );
}

#[test]
fn test_download_size_preset() {
    let mut optimizer = Optimizer::new(
        OptimizerConfig::default(),
        SnapshotStore::open(MemoryStorage::new()),
    );
    let mut project = create_level();
    project
        .dependencies
        .push("Assets/Audio/ambience.wav".to_string());

    let report = optimizer.optimize_for_download_size(&mut project);
    assert_eq!(report.changed(), 3);
    assert!(report.save_error.is_none());

    assert_eq!(
        project
            .texture("Assets/Textures/albedo.png")
            .unwrap()
            .max_texture_size,
        1024
    );
    let normal = project.texture("Assets/Textures/normal.png").unwrap();
    assert_eq!(normal.max_texture_size, 1024);
    assert!(!normal.crunched_compression);
    let audio = project.audio("Assets/Audio/ambience.wav").unwrap();
    assert!(audio.force_to_mono);
    assert!(audio.quality <= 0.5);

    assert_eq!(optimizer.optimize_for_download_size(&mut project).changed(), 0);
    assert_eq!(optimizer.revert(&mut project).restored, 3);
}

#[test]
fn test_file_backup_copies_before_change() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Assets/Textures")).unwrap();
    fs::write(dir.path().join("Assets/Textures/albedo.png"), b"pixels").unwrap();

    let config = OptimizerConfig {
        file_backup: true,
        ..Default::default()
    };
    let mut optimizer = Optimizer::open(config, dir.path());
    let mut project = create_level();
    optimizer.run_pass(&mut project, "textures").unwrap();

    let copy = dir
        .path()
        .join("Assets/SceneOpt/Backups/Textures/albedo.png");
    assert_eq!(fs::read(copy).unwrap(), b"pixels");
    // Sources that do not exist on disk are skipped without failing the pass
    assert!(!dir
        .path()
        .join("Assets/SceneOpt/Backups/Textures/normal.png")
        .exists());
}

#[test]
fn test_explicit_file_backup_location() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("Assets/Audio")).unwrap();
    fs::write(dir.path().join("Assets/Audio/ambience.wav"), b"RIFF").unwrap();

    let mut optimizer = Optimizer::new(
        OptimizerConfig::default(),
        SnapshotStore::open(MemoryStorage::new()),
    )
    .with_file_backup(FileBackup::new(dir.path(), "Backups"));
    let mut project = create_level();
    optimizer.run_pass(&mut project, "audio").unwrap();

    assert!(dir.path().join("Backups/Audio/ambience.wav").exists());
}

#[test]
fn test_merge_through_optimizer() {
    let mut optimizer = Optimizer::new(
        OptimizerConfig::default(),
        SnapshotStore::open(MemoryStorage::new()),
    );
    let mut project = create_level();
    let level = project.scene.find_by_name("Level").unwrap();

    let report = optimizer.merge_meshes(&mut project, level).unwrap();
    assert_eq!(report.merged.len(), 1);
    assert_eq!(report.merged[0].face_count, 6);
    assert_eq!(report.merged[0].sources.len(), 3);
    for id in &report.merged[0].sources {
        assert!(!project.scene.node(*id).unwrap().renderer().unwrap().enabled);
    }

    // The combined mesh is now the only enabled prop renderer
    let enabled: Vec<NodeId> = project
        .scene
        .ids()
        .filter(|&id| {
            project
                .scene
                .node(id)
                .and_then(|n| n.renderer())
                .is_some_and(|r| r.enabled)
        })
        .collect();
    assert_eq!(enabled, vec![report.merged[0].node]);
}

#[test]
fn test_lods_through_optimizer() {
    let mut optimizer = Optimizer::new(
        OptimizerConfig::default(),
        SnapshotStore::open(MemoryStorage::new()),
    );
    let mut project = create_level();
    let prop = project.scene.find_by_name("Prop0").unwrap();

    let report = optimizer
        .generate_lods(&mut project, prop, &LodSettings::default())
        .unwrap();
    assert_eq!(
        report.generated.len() + report.collapsed.len(),
        LodSettings::default().levels.len()
    );
    assert!(project.scene.node(prop).unwrap().lod_group().is_some());
}

#[test]
fn test_error_log_receives_pass_failures() {
    let dir = tempdir().unwrap();
    let config = OptimizerConfig {
        error_log: Some("errors.log".into()),
        ..Default::default()
    };
    let mut optimizer = Optimizer::open(config, dir.path());
    let mut project = create_level();
    project.lock("Assets/Textures/albedo.png");

    // A locked asset is a per-item failure, not a pass failure
    let report = optimizer.run_all(&mut project);
    assert!(report.failures().next().is_none());
    assert!(!dir.path().join("errors.log").exists());

    struct Broken;
    impl OptimizationPass for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }
        fn run(&self, _ctx: &mut PassContext<'_>) -> sceneopt_core::Result<usize> {
            Err(sceneopt_core::Error::Unsupported("lightmaps".to_string()))
        }
    }
    optimizer.add_pass(Box::new(Broken), true);
    let report = optimizer.run_all(&mut project);
    assert_eq!(report.failures().count(), 1);
    let log = fs::read_to_string(dir.path().join("errors.log")).unwrap();
    assert!(log.contains("pass 'broken' failed"));
}

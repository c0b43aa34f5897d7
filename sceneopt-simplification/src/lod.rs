//! Level-of-detail generation on top of grid clustering

use crate::clustering::GridClusteringSimplifier;
use crate::MeshSimplifier;
use sceneopt_core::{Component, Error, LodLevel, MeshRenderer, NodeId, Result, SceneGraph};

/// One generated level below the original mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodTarget {
    /// 1.0 keeps the most detail
    pub quality: f32,
    /// Relative screen height at which this level stops being used
    pub screen_height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LodSettings {
    /// Screen height of LOD0, the original renderer
    pub base_screen_height: f32,
    pub levels: Vec<LodTarget>,
    /// Replace an existing LOD group instead of failing
    pub overwrite: bool,
}

impl Default for LodSettings {
    fn default() -> Self {
        Self {
            base_screen_height: 0.6,
            levels: vec![
                LodTarget {
                    quality: 0.5,
                    screen_height: 0.3,
                },
                LodTarget {
                    quality: 0.2,
                    screen_height: 0.1,
                },
            ],
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLod {
    /// 1 for the first reduced level
    pub level: usize,
    pub node: NodeId,
    pub resolution: u32,
    pub vertex_count: usize,
    pub face_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LodReport {
    pub generated: Vec<GeneratedLod>,
    /// Levels whose simplification collapsed the mesh entirely
    pub collapsed: Vec<usize>,
}

/// Build reduced copies of `target`'s mesh as child nodes and attach a LOD
/// group that switches between them.
pub fn generate_lods(
    scene: &mut SceneGraph,
    target: NodeId,
    settings: &LodSettings,
) -> Result<LodReport> {
    let node = scene.get(target)?;
    let target_name = node.name.clone();
    if node.lod_group().is_some() && !settings.overwrite {
        return Err(Error::InvalidData(format!(
            "'{target_name}' already has a LOD group"
        )));
    }
    let renderer = node
        .renderer()
        .ok_or_else(|| Error::InvalidData(format!("'{target_name}' has no mesh renderer")))?;
    let source = renderer
        .mesh
        .clone()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| Error::InvalidData(format!("'{target_name}' has no mesh to reduce")))?;
    let materials = renderer.materials.clone();

    let mut report = LodReport::default();
    let mut levels = vec![LodLevel {
        screen_height: settings.base_screen_height,
        renderers: vec![target],
    }];

    for (i, wanted) in settings.levels.iter().enumerate() {
        let level = i + 1;
        let simplifier = GridClusteringSimplifier::from_quality(wanted.quality);
        let Some(mesh) = simplifier.simplify(&source)? else {
            log::warn!("LOD{level} of '{target_name}' collapsed to nothing, skipping it");
            report.collapsed.push(level);
            continue;
        };
        let mesh = mesh.with_name(format!("{}_LOD{level}", source.name));
        let vertex_count = mesh.vertex_count();
        let face_count = mesh.face_count();

        let child = scene.add_child(target, format!("{target_name}_LOD{level}"))?;
        scene
            .get_mut(child)?
            .components
            .push(Component::Renderer(MeshRenderer {
                mesh: Some(mesh),
                materials: materials.clone(),
                enabled: true,
            }));

        levels.push(LodLevel {
            screen_height: wanted.screen_height,
            renderers: vec![child],
        });
        report.generated.push(GeneratedLod {
            level,
            node: child,
            resolution: simplifier.resolution,
            vertex_count,
            face_count,
        });
    }

    let node = scene.get_mut(target)?;
    node.components
        .retain(|c| !matches!(c, Component::LodGroup { .. }));
    node.components.push(Component::LodGroup { levels });

    log::info!(
        "generated {} LOD levels for '{target_name}'",
        report.generated.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sceneopt_core::{Point3f, TriangleMesh};

    fn grid(size: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let z = ((x * 7 + y * 3) % 5) as f32 * 0.1;
                vertices.push(Point3f::new(x as f32, y as f32, z));
            }
        }
        let mut faces = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let tl = y * size + x;
                let tr = tl + 1;
                let bl = (y + 1) * size + x;
                let br = bl + 1;
                faces.push([tl, bl, tr]);
                faces.push([tr, bl, br]);
            }
        }
        TriangleMesh::from_vertices_and_faces(vertices, faces).with_name("terrain")
    }

    fn scene_with(mesh: TriangleMesh) -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        let target = scene.add_root("Rock");
        scene
            .node_mut(target)
            .unwrap()
            .components
            .push(Component::Renderer(MeshRenderer::new(mesh, "Assets/rock.mat")));
        (scene, target)
    }

    #[test]
    fn test_generates_two_levels() {
        let source = grid(60);
        let (mut scene, target) = scene_with(source.clone());
        let report = generate_lods(&mut scene, target, &LodSettings::default()).unwrap();

        assert_eq!(report.generated.len(), 2);
        assert_eq!(report.generated[0].resolution, 25);
        assert_eq!(report.generated[1].resolution, 10);
        assert!(report.generated[0].face_count < source.face_count());
        assert!(report.generated[1].face_count <= report.generated[0].face_count);

        let lod1 = scene.node(report.generated[0].node).unwrap();
        assert_eq!(lod1.name, "Rock_LOD1");
        assert_eq!(lod1.parent, Some(target));
        let renderer = lod1.renderer().unwrap();
        assert_eq!(renderer.shared_material(), Some("Assets/rock.mat"));
        assert_eq!(renderer.mesh.as_ref().unwrap().name, "terrain_LOD1");

        let levels = scene.node(target).unwrap().lod_group().unwrap();
        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].renderers, vec![target]);
        assert_eq!(levels[2].screen_height, 0.1);
    }

    #[test]
    fn test_existing_group_requires_overwrite() {
        let (mut scene, target) = scene_with(grid(10));
        generate_lods(&mut scene, target, &LodSettings::default()).unwrap();
        assert!(generate_lods(&mut scene, target, &LodSettings::default()).is_err());

        let settings = LodSettings {
            overwrite: true,
            ..Default::default()
        };
        generate_lods(&mut scene, target, &settings).unwrap();
        let groups = scene
            .node(target)
            .unwrap()
            .components
            .iter()
            .filter(|c| matches!(c, Component::LodGroup { .. }))
            .count();
        assert_eq!(groups, 1);
    }

    #[test]
    fn test_collapsed_level_is_omitted() {
        let p = Point3f::new(0.0, 0.0, 0.0);
        let degenerate = TriangleMesh::from_vertices_and_faces(vec![p, p, p], vec![[0, 1, 2]]);
        let (mut scene, target) = scene_with(degenerate);
        let report = generate_lods(&mut scene, target, &LodSettings::default()).unwrap();

        assert!(report.generated.is_empty());
        assert_eq!(report.collapsed, vec![1, 2]);
        assert_eq!(scene.node(target).unwrap().lod_group().unwrap().len(), 1);
    }

    #[test]
    fn test_target_without_renderer_fails() {
        let mut scene = SceneGraph::new();
        let target = scene.add_root("empty");
        assert!(generate_lods(&mut scene, target, &LodSettings::default()).is_err());
    }
}

//! Material-grouped mesh merging
//!
//! Drawable primitives below a root node that share a material are baked into
//! one combined mesh expressed in the root's local space. The combined mesh is
//! attached to a new child of the root and the source renderers are disabled,
//! not deleted, so re-enabling them undoes the merge.

use sceneopt_core::{
    Component, Error, IndexFormat, MeshRenderer, NodeId, Result, SceneGraph, Transform3D,
    TriangleMesh,
};
use std::collections::HashMap;
use std::path::Path;

/// One material's worth of primitives waiting to be combined
#[derive(Debug, Clone)]
pub struct MergeGroup {
    pub material: String,
    /// Source node and its transform relative to the merge root
    pub members: Vec<(NodeId, Transform3D)>,
}

/// A primitive that could not take part in the merge
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPrimitive {
    pub node: NodeId,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedGroup {
    pub material: String,
    /// Node holding the combined mesh
    pub node: NodeId,
    /// Nodes whose renderers were disabled
    pub sources: Vec<NodeId>,
    pub vertex_count: usize,
    pub face_count: usize,
    pub index_format: IndexFormat,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub merged: Vec<MergedGroup>,
    pub skipped: Vec<SkippedPrimitive>,
    /// Materials used by a single primitive, left untouched
    pub single_member_groups: usize,
    /// Groups that failed while being built
    pub errors: Vec<String>,
}

/// Combines primitives that share a material
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialMerger {
    /// Also merge renderers that are already disabled
    pub include_disabled: bool,
}

impl MaterialMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group the primitives below `root` (root included) by shared material,
    /// in order of first appearance.
    pub fn collect_groups(
        &self,
        scene: &SceneGraph,
        root: NodeId,
    ) -> Result<(Vec<MergeGroup>, Vec<SkippedPrimitive>)> {
        let root_world_to_local = scene.world_to_local(root)?;
        let mut groups: Vec<MergeGroup> = Vec::new();
        let mut by_material: HashMap<String, usize> = HashMap::new();
        let mut skipped = Vec::new();

        for id in scene.descendants(root)? {
            let node = scene.get(id)?;
            let Some(renderer) = node.renderer() else {
                continue;
            };
            if !renderer.enabled && !self.include_disabled {
                continue;
            }
            if renderer.mesh.as_ref().map_or(true, |m| m.is_empty()) {
                skipped.push(SkippedPrimitive {
                    node: id,
                    reason: "renderer has no geometry".to_string(),
                });
                continue;
            }
            let Some(material) = renderer.shared_material() else {
                skipped.push(SkippedPrimitive {
                    node: id,
                    reason: "renderer has no material".to_string(),
                });
                continue;
            };

            let relative = root_world_to_local * scene.local_to_world(id)?;
            let slot = *by_material.entry(material.to_string()).or_insert_with(|| {
                groups.push(MergeGroup {
                    material: material.to_string(),
                    members: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].members.push((id, relative));
        }

        Ok((groups, skipped))
    }

    /// Merge every material group with two or more members under `root`
    pub fn merge(&self, scene: &mut SceneGraph, root: NodeId) -> Result<MergeReport> {
        let (groups, skipped) = self.collect_groups(scene, root)?;
        let mut report = MergeReport {
            skipped,
            ..Default::default()
        };

        for group in groups {
            if group.members.len() < 2 {
                report.single_member_groups += 1;
                continue;
            }
            match merge_group(scene, root, &group) {
                Ok(merged) => {
                    log::info!(
                        "merged {} primitives using '{}' into {} vertices ({:?} indices)",
                        merged.sources.len(),
                        merged.material,
                        merged.vertex_count,
                        merged.index_format
                    );
                    report.merged.push(merged);
                }
                Err(e) => {
                    let msg = format!("merge of material '{}' failed: {}", group.material, e);
                    log::error!("{msg}");
                    report.errors.push(msg);
                }
            }
        }

        for s in &report.skipped {
            log::debug!("skipped node {}: {}", s.node.0, s.reason);
        }
        Ok(report)
    }
}

fn merge_group(scene: &mut SceneGraph, root: NodeId, group: &MergeGroup) -> Result<MergedGroup> {
    let mut parts = Vec::with_capacity(group.members.len());
    for (id, relative) in &group.members {
        let mesh = scene
            .get(*id)?
            .renderer()
            .and_then(|r| r.mesh.as_ref())
            .ok_or_else(|| Error::NotFound(format!("mesh of scene node {}", id.0)))?;
        parts.push(mesh.transformed(relative));
    }

    let label = material_label(&group.material);
    let combined = combine_meshes(&parts).with_name(format!("CombinedMesh_{label}"));
    let vertex_count = combined.vertex_count();
    let face_count = combined.face_count();
    let index_format = combined.index_format;

    let node = scene.add_child(root, format!("Combined_{label}"))?;
    scene
        .get_mut(node)?
        .components
        .push(Component::Renderer(MeshRenderer::new(
            combined,
            group.material.clone(),
        )));

    let mut sources = Vec::with_capacity(group.members.len());
    for (id, _) in &group.members {
        if let Some(renderer) = scene.get_mut(*id)?.renderer_mut() {
            renderer.enabled = false;
        }
        sources.push(*id);
    }

    Ok(MergedGroup {
        material: group.material.clone(),
        node,
        sources,
        vertex_count,
        face_count,
        index_format,
    })
}

/// Concatenate meshes that already share a coordinate space.
///
/// Normals and UVs survive only when every part carries them. The index
/// format is chosen from the total vertex count.
pub fn combine_meshes(parts: &[TriangleMesh]) -> TriangleMesh {
    let total_vertices: usize = parts.iter().map(|m| m.vertex_count()).sum();
    let total_faces: usize = parts.iter().map(|m| m.face_count()).sum();
    let keep_normals = !parts.is_empty() && parts.iter().all(|m| m.normals.is_some());
    let keep_uvs = !parts.is_empty() && parts.iter().all(|m| m.uvs.is_some());

    let mut vertices = Vec::with_capacity(total_vertices);
    let mut faces = Vec::with_capacity(total_faces);
    let mut normals = keep_normals.then(|| Vec::with_capacity(total_vertices));
    let mut uvs = keep_uvs.then(|| Vec::with_capacity(total_vertices));

    for part in parts {
        let offset = vertices.len();
        vertices.extend_from_slice(&part.vertices);
        faces.extend(
            part.faces
                .iter()
                .map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]),
        );
        if let (Some(out), Some(source)) = (normals.as_mut(), part.normals.as_ref()) {
            out.extend_from_slice(source);
        }
        if let (Some(out), Some(source)) = (uvs.as_mut(), part.uvs.as_ref()) {
            out.extend_from_slice(source);
        }
    }

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    mesh.normals = normals;
    mesh.uvs = uvs;
    mesh
}

/// Short material name used for generated nodes: the file stem of its path
fn material_label(material: &str) -> String {
    Path::new(material)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(material)
        .to_string()
}

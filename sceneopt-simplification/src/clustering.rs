//! Clustering-based mesh simplification
//!
//! Uniform-grid vertex clustering (Rossignac & Borrel 1993). The mesh bounds
//! are divided into cubic cells whose side is the largest bounds extent divided
//! by the grid resolution. Every occupied cell collapses to one representative
//! vertex at the mean of its members; triangles that lose a corner in the
//! collapse are dropped.

use crate::MeshSimplifier;
use sceneopt_core::{Aabb, Drawable, Point3f, Result, TriangleMesh, Vector3f, UV};
use std::collections::BTreeMap;

/// Lowest grid resolution accepted; coarser grids collapse most meshes entirely
pub const MIN_RESOLUTION: u32 = 5;

/// Integer grid coordinate of a cluster cell
pub type CellKey = (i64, i64, i64);

/// Uniform grid vertex-clustering simplifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridClusteringSimplifier {
    /// Number of cells along the largest bounds axis
    pub resolution: u32,
}

impl Default for GridClusteringSimplifier {
    fn default() -> Self {
        Self { resolution: 25 }
    }
}

impl GridClusteringSimplifier {
    pub fn new(resolution: u32) -> Self {
        Self {
            resolution: resolution.max(MIN_RESOLUTION),
        }
    }

    /// Resolution for a detail level where 1.0 keeps the most detail (50 cells)
    pub fn from_quality(quality: f32) -> Self {
        Self::new((50.0 * quality).round().max(0.0) as u32)
    }

    /// The resolution actually used; the public field may be set below the minimum
    pub fn effective_resolution(&self) -> u32 {
        self.resolution.max(MIN_RESOLUTION)
    }

    fn cell_size(&self, bounds: &Aabb) -> f64 {
        let mut extent = bounds.max_extent() as f64;
        if !(extent > 0.0) {
            // Point-like mesh
            extent = 1.0;
        }
        extent / self.effective_resolution() as f64
    }

    /// Group vertex indices by the grid cell they fall into.
    ///
    /// Cells are ordered by coordinate, so the grouping does not depend on the
    /// order vertices are listed in.
    pub fn cluster(&self, mesh: &TriangleMesh) -> BTreeMap<CellKey, Vec<usize>> {
        let mut cells: BTreeMap<CellKey, Vec<usize>> = BTreeMap::new();
        let Some(bounds) = mesh.bounding_box() else {
            return cells;
        };
        let cell_size = self.cell_size(&bounds);
        let origin = bounds.min;

        for (vi, v) in mesh.vertices.iter().enumerate() {
            let key = (
                ((v.x as f64 - origin.x as f64) / cell_size).floor() as i64,
                ((v.y as f64 - origin.y as f64) / cell_size).floor() as i64,
                ((v.z as f64 - origin.z as f64) / cell_size).floor() as i64,
            );
            cells.entry(key).or_default().push(vi);
        }
        cells
    }
}

fn mean_position(cluster: &[usize], positions: &[Point3f]) -> Point3f {
    let mut sum = [0.0f64; 3];
    for &vi in cluster {
        for axis in 0..3 {
            sum[axis] += positions[vi][axis] as f64;
        }
    }
    let n = cluster.len() as f64;
    Point3f::new((sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32)
}

fn mean_normal(cluster: &[usize], normals: &[Vector3f]) -> Vector3f {
    let mut sum = [0.0f64; 3];
    for &vi in cluster {
        for axis in 0..3 {
            sum[axis] += normals[vi][axis] as f64;
        }
    }
    let len = (sum[0] * sum[0] + sum[1] * sum[1] + sum[2] * sum[2]).sqrt();
    if len > 1e-12 {
        sum.iter_mut().for_each(|c| *c /= len);
    }
    Vector3f::new(sum[0] as f32, sum[1] as f32, sum[2] as f32)
}

fn mean_uv(cluster: &[usize], uvs: &[UV]) -> UV {
    let mut sum = [0.0f64; 2];
    for &vi in cluster {
        sum[0] += uvs[vi][0] as f64;
        sum[1] += uvs[vi][1] as f64;
    }
    let n = cluster.len() as f64;
    [(sum[0] / n) as f32, (sum[1] / n) as f32]
}

impl MeshSimplifier for GridClusteringSimplifier {
    fn simplify(&self, mesh: &TriangleMesh) -> Result<Option<TriangleMesh>> {
        mesh.validate()?;
        if mesh.vertices.is_empty() {
            return Ok(None);
        }

        let cells = self.cluster(mesh);

        let mut old_to_new = vec![0usize; mesh.vertices.len()];
        let mut vertices = Vec::with_capacity(cells.len());
        let mut normals = mesh.normals.as_ref().map(|_| Vec::with_capacity(cells.len()));
        let mut uvs = mesh.uvs.as_ref().map(|_| Vec::with_capacity(cells.len()));

        for (new_index, cluster) in cells.values().enumerate() {
            vertices.push(mean_position(cluster, &mesh.vertices));
            if let (Some(out), Some(source)) = (normals.as_mut(), mesh.normals.as_ref()) {
                out.push(mean_normal(cluster, source));
            }
            if let (Some(out), Some(source)) = (uvs.as_mut(), mesh.uvs.as_ref()) {
                out.push(mean_uv(cluster, source));
            }
            for &vi in cluster {
                old_to_new[vi] = new_index;
            }
        }

        let faces: Vec<[usize; 3]> = mesh
            .faces
            .iter()
            .map(|f| [old_to_new[f[0]], old_to_new[f[1]], old_to_new[f[2]]])
            .filter(|f| f[0] != f[1] && f[1] != f[2] && f[2] != f[0])
            .collect();

        if faces.is_empty() {
            log::debug!(
                "mesh '{}' collapsed to nothing at resolution {}",
                mesh.name,
                self.effective_resolution()
            );
            return Ok(None);
        }

        let mut result = TriangleMesh::from_vertices_and_faces(vertices, faces)
            .with_name(mesh.name.clone());
        result.normals = normals;
        result.uvs = uvs;
        Ok(Some(result))
    }
}

//! Mesh data structures and functionality

use crate::point::*;
use crate::transform::Transform3D;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Largest vertex count addressable with 16-bit indices
pub const MAX_NARROW_VERTEX_COUNT: usize = u16::MAX as usize;

/// Width of the index buffer a mesh is uploaded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexFormat {
    #[default]
    U16,
    U32,
}

impl IndexFormat {
    /// Pick the narrowest format able to address `vertex_count` vertices
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count > MAX_NARROW_VERTEX_COUNT {
            IndexFormat::U32
        } else {
            IndexFormat::U16
        }
    }
}

/// A triangle mesh with optional per-vertex normals and one UV channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangleMesh {
    pub name: String,
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub uvs: Option<Vec<UV>>,
    pub index_format: IndexFormat,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            name: String::new(),
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
            uvs: None,
            index_format: IndexFormat::U16,
        }
    }

    /// Create a mesh from vertices and faces, choosing the index format from the vertex count
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        let index_format = IndexFormat::for_vertex_count(vertices.len());
        Self {
            vertices,
            faces,
            index_format,
            ..Self::new()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Set vertex normals; ignored when the length does not match the vertex count
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Set UV channel 0; ignored when the length does not match the vertex count
    pub fn set_uvs(&mut self, uvs: Vec<UV>) {
        if uvs.len() == self.vertices.len() {
            self.uvs = Some(uvs);
        }
    }

    /// Check that every face references an existing vertex and that the
    /// attribute channels line up with the vertex list.
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        if let Some((fi, face)) = self
            .faces
            .iter()
            .enumerate()
            .find(|(_, f)| f.iter().any(|&vi| vi >= n))
        {
            return Err(Error::InvalidData(format!(
                "mesh '{}': face {} {:?} references a vertex outside 0..{}",
                self.name, fi, face, n
            )));
        }
        if self.normals.as_ref().is_some_and(|v| v.len() != n) {
            return Err(Error::InvalidData(format!(
                "mesh '{}': normal count does not match vertex count",
                self.name
            )));
        }
        if self.uvs.as_ref().is_some_and(|v| v.len() != n) {
            return Err(Error::InvalidData(format!(
                "mesh '{}': uv count does not match vertex count",
                self.name
            )));
        }
        Ok(())
    }

    /// Copy of this mesh with positions and normals moved by `transform`
    pub fn transformed(&self, transform: &Transform3D) -> Self {
        let vertices = self
            .vertices
            .iter()
            .map(|v| transform.transform_point(v))
            .collect();
        let normals = self.normals.as_ref().map(|normals| {
            normals
                .iter()
                .map(|n| transform.transform_normal(n))
                .collect()
        });
        Self {
            name: self.name.clone(),
            vertices,
            faces: self.faces.clone(),
            normals,
            uvs: self.uvs.clone(),
            index_format: self.index_format,
        }
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.normals = None;
        self.uvs = None;
        self.index_format = IndexFormat::U16;
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

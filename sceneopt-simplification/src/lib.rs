//! Mesh simplification and merging
//!
//! This crate provides the geometry reduction side of the optimizer:
//! - Uniform-grid vertex clustering
//! - Level-of-detail generation built on clustering
//! - Merging of primitives that share a material

pub mod clustering;
pub mod lod;
pub mod merge;

pub use clustering::*;
pub use lod::*;
pub use merge::*;

use sceneopt_core::{Result, TriangleMesh};

/// Reduce the vertex and triangle count of a mesh
pub trait MeshSimplifier {
    /// Simplify `mesh`; `Ok(None)` when nothing drawable is left after reduction
    fn simplify(&self, mesh: &TriangleMesh) -> Result<Option<TriangleMesh>>;
}

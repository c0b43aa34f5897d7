//! Core data structures and traits for sceneopt
//!
//! This crate provides the types shared by the optimizer crates: triangle
//! meshes and transforms, the scene graph, asset import settings, and the
//! traits through which the optimizer talks to its host editor.

pub mod asset;
pub mod error;
pub mod host;
pub mod mesh;
pub mod point;
pub mod project;
pub mod scene;
pub mod traits;
pub mod transform;

pub use asset::*;
pub use error::*;
pub use host::*;
pub use mesh::*;
pub use point::*;
pub use project::*;
pub use scene::*;
pub use traits::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

//! Point and vector aliases shared by the geometry types

use nalgebra::{Point3, Vector3};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Texture coordinates (UV channel 0)
pub type UV = [f32; 2];

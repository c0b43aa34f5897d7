//! Affine transforms between node, world and root spaces

use nalgebra::{Matrix3, Matrix4, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A homogeneous 4x4 transform applied to mesh positions and normals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a rotation transformation from a quaternion
    pub fn rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            matrix: rotation.to_homogeneous(),
        }
    }

    /// Create a non-uniform scaling transformation
    pub fn scaling(scale: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&scale),
        }
    }

    /// Translation * rotation * scale, the order node transforms are composed in
    pub fn from_trs(
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self::translation(translation) * Self::rotation(rotation) * Self::scaling(scale)
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// Transform a surface normal by the inverse transpose of the linear part.
    ///
    /// The result is renormalized; a zero normal stays zero.
    pub fn transform_normal(&self, normal: &Vector3<f32>) -> Vector3<f32> {
        let linear: Matrix3<f32> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|inv| inv.transpose())
            .unwrap_or(linear);
        let n = normal_matrix * normal;
        let len = n.norm();
        if len > 1e-12 {
            n / len
        } else {
            n
        }
    }

    /// Compose this transformation with another (`self` applied last)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self {
            matrix: inv_matrix,
        })
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f32>> for Transform3D {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translation_then_inverse() {
        let t = Transform3D::translation(Vector3::new(1.0, 2.0, 3.0));
        let p = t.transform_point(&Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(1.0, 2.0, 3.0));

        let back = t.inverse().unwrap().transform_point(&p);
        assert_relative_eq!(back, Point3::origin(), epsilon = 1e-6);
    }

    #[test]
    fn test_normal_ignores_translation_and_handles_scale() {
        let t = Transform3D::translation(Vector3::new(5.0, 0.0, 0.0))
            * Transform3D::scaling(Vector3::new(2.0, 1.0, 1.0));
        let n = t.transform_normal(&Vector3::new(1.0, 1.0, 0.0).normalize());
        // Stretching along x flattens the normal towards y
        assert!(n.y > n.x);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_trs_order() {
        let t = Transform3D::from_trs(
            Vector3::new(10.0, 0.0, 0.0),
            UnitQuaternion::identity(),
            Vector3::new(2.0, 2.0, 2.0),
        );
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(12.0, 0.0, 0.0));
    }
}

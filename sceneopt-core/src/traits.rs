//! Core traits for sceneopt

use crate::{mesh::TriangleMesh, point::*};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3f,
    pub max: Point3f,
}

impl Aabb {
    /// Bounds of a set of points; `None` for an empty set
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3f>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;

        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        Some(Self { min, max })
    }

    pub fn size(&self) -> Vector3f {
        self.max - self.min
    }

    /// Largest side length
    pub fn max_extent(&self) -> f32 {
        let s = self.size();
        s.x.max(s.y).max(s.z)
    }

    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }
}

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object, `None` when it has no vertices
    fn bounding_box(&self) -> Option<Aabb>;

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        self.bounding_box()
            .map(|b| b.center())
            .unwrap_or_else(Point3f::origin)
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }
}

//! High-level collision shape abstractions
//!
//! Shapes are stored in model space on the collider component and turned into
//! world-space shapes on demand, using only the translation and scale of the
//! owning transform. Rotation is ignored: every shape stays axis aligned.

use crate::foundation::math::Vec3;
use super::primitives::{BoundingSphere, AABB};

/// Collision shape types (stored in MODEL SPACE)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionShape {
    /// Axis-aligned box given by its half extents
    Box(Vec3),
    /// Sphere given by its radius
    Sphere(f32),
}

/// Discriminant of a [`CollisionShape`], used to pick the narrow-phase test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Axis-aligned box
    Box,
    /// Sphere
    Sphere,
}

impl CollisionShape {
    /// Creates a box collision shape from half extents
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box(half_extents)
    }

    /// Creates a spherical collision shape with given radius
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere(radius)
    }

    /// Which narrow-phase family this shape belongs to
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Box(_) => ShapeKind::Box,
            Self::Sphere(_) => ShapeKind::Sphere,
        }
    }

    /// Transform this shape to world space using position and scale.
    ///
    /// Box half extents scale per axis; a sphere radius scales by the largest
    /// absolute scale component so the sphere always covers the scaled shape.
    pub fn to_world_space(&self, position: Vec3, scale: Vec3) -> WorldSpaceShape {
        let scale = scale.abs();
        match self {
            Self::Box(half_extents) => WorldSpaceShape::Box(AABB::from_center_half_extents(
                position,
                half_extents.component_mul(&scale),
            )),
            Self::Sphere(radius) => {
                WorldSpaceShape::Sphere(BoundingSphere::new(position, radius * scale.max()))
            }
        }
    }
}

/// World-space collision shape (temporary, for testing only)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldSpaceShape {
    /// World-space box
    Box(AABB),
    /// World-space sphere
    Sphere(BoundingSphere),
}

impl WorldSpaceShape {
    /// Get center position
    pub fn center(&self) -> Vec3 {
        match self {
            Self::Box(aabb) => aabb.center(),
            Self::Sphere(sphere) => sphere.center,
        }
    }

    /// Bounding box used by the broad phase
    pub fn aabb(&self) -> AABB {
        match self {
            Self::Box(aabb) => *aabb,
            Self::Sphere(sphere) => sphere.aabb(),
        }
    }

    /// Exact narrow-phase test, dispatched on the pair of shape kinds
    pub fn intersects(&self, other: &WorldSpaceShape) -> bool {
        match (self, other) {
            (Self::Box(a), Self::Box(b)) => a.intersects(b),
            (Self::Sphere(a), Self::Sphere(b)) => a.intersects(b),
            (Self::Box(aabb), Self::Sphere(sphere)) |
            (Self::Sphere(sphere), Self::Box(aabb)) => sphere.intersects_aabb(aabb),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_scales_per_axis() {
        let shape = CollisionShape::cuboid(Vec3::new(1.0, 1.0, 1.0));
        let world = shape.to_world_space(Vec3::new(10.0, 0.0, 0.0), Vec3::new(2.0, 1.0, -3.0));
        let aabb = world.aabb();
        assert_eq!(aabb.min, Vec3::new(8.0, -1.0, -3.0));
        assert_eq!(aabb.max, Vec3::new(12.0, 1.0, 3.0));
    }

    #[test]
    fn test_sphere_uses_largest_scale() {
        let shape = CollisionShape::sphere(0.5);
        let world = shape.to_world_space(Vec3::zeros(), Vec3::new(1.0, 4.0, 2.0));
        match world {
            WorldSpaceShape::Sphere(s) => assert_eq!(s.radius, 2.0),
            WorldSpaceShape::Box(_) => panic!("expected a sphere"),
        }
    }

    #[test]
    fn test_mixed_pair_dispatch_is_symmetric() {
        let a = CollisionShape::cuboid(Vec3::repeat(0.5)).to_world_space(Vec3::zeros(), Vec3::repeat(1.0));
        let b = CollisionShape::sphere(0.5).to_world_space(Vec3::new(1.0, 0.0, 0.0), Vec3::repeat(1.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }
}

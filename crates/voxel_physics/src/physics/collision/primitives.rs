//! Primitive collision shapes and intersection algorithms
//!
//! Provides the axis-aligned bounding box, bounding sphere and ray types
//! with the inclusive intersection predicates the broad and narrow phases
//! rely on. Touching at a face counts as intersecting everywhere in this
//! module.

use crate::foundation::math::Vec3;

/// Axis-Aligned Bounding Box
///
/// A box is *valid* when `min <= max` on every axis. [`AABB::reset`] builds
/// the empty sentinel (`min = +inf`, `max = -inf`) which is the identity
/// element for [`AABB::union`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// The empty box: identity for union, contains nothing
    pub fn reset() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Whether `min <= max` on all three axes
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Full size of the box.
    ///
    /// Meaningless (negative) for a reset box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half size of the AABB
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Surface area `2 * (sx*sy + sx*sz + sy*sz)`.
    ///
    /// Callers must not feed a reset box into cost computations.
    pub fn surface_area(&self) -> f32 {
        let s = self.size();
        2.0 * (s.x * s.y + s.x * s.z + s.y * s.z)
    }

    /// Tightest box containing both `self` and `other`
    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Check if `other` lies entirely within this box (inclusive)
    pub fn contains(&self, other: &AABB) -> bool {
        other.min.x >= self.min.x && other.max.x <= self.max.x &&
        other.min.y >= self.min.y && other.max.y <= self.max.y &&
        other.min.z >= self.min.z && other.max.z <= self.max.z
    }

    /// Check if this AABB contains a point (inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another AABB (touching faces count)
    pub fn intersects(&self, other: &AABB) -> bool {
        self.max.x >= other.min.x && other.max.x >= self.min.x &&
        self.max.y >= other.min.y && other.max.y >= self.min.y &&
        self.max.z >= other.min.z && other.max.z >= self.min.z
    }

    /// Check if this AABB intersects a sphere
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        sphere.intersects_aabb(self)
    }

    /// Closest point inside the box to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Copy of this box moved by `offset`
    pub fn translated(&self, offset: Vec3) -> AABB {
        AABB {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Copy of this box grown by `margin` on every side
    pub fn expanded(&self, margin: f32) -> AABB {
        let m = Vec3::repeat(margin);
        AABB {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Test ray intersection with this AABB using the slab method.
    ///
    /// Returns the distance to the entry point (0 when the origin is inside).
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv = |d: f32| if d == 0.0 { f32::INFINITY } else { 1.0 / d };
        let inv_dir = Vec3::new(inv(ray.direction.x), inv(ray.direction.y), inv(ray.direction.z));

        let t1 = (self.min.x - ray.origin.x) * inv_dir.x;
        let t2 = (self.max.x - ray.origin.x) * inv_dir.x;
        let t3 = (self.min.y - ray.origin.y) * inv_dir.y;
        let t4 = (self.max.y - ray.origin.y) * inv_dir.y;
        let t5 = (self.min.z - ray.origin.z) * inv_dir.z;
        let t6 = (self.max.z - ray.origin.z) * inv_dir.z;

        let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
        let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }
}

impl Default for AABB {
    fn default() -> Self {
        Self::reset()
    }
}

/// A ray for ray casting
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction.
    ///
    /// A zero direction stays zero rather than turning into NaN.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: crate::foundation::math::utils::safe_normalize(direction),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere in world space
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere intersects with another (touching counts)
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }

    /// Check if this sphere intersects a box.
    ///
    /// Clamps the center onto the box and compares squared distances.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        let closest = aabb.closest_point(self.center);
        (closest - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Tight box around the sphere
    pub fn aabb(&self) -> AABB {
        AABB::from_center_half_extents(self.center, Vec3::repeat(self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(x: f32, y: f32, z: f32) -> AABB {
        AABB::from_center_half_extents(Vec3::new(x, y, z), Vec3::repeat(0.5))
    }

    #[test]
    fn test_union_with_reset_is_identity() {
        let a = AABB::new(Vec3::new(-1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(AABB::reset().union(&a), a);
        assert_eq!(a.union(&AABB::reset()), a);
    }

    #[test]
    fn test_union_is_commutative_and_tight() {
        let a = unit_box_at(0.0, 0.0, 0.0);
        let b = unit_box_at(3.0, -2.0, 1.0);
        let u = a.union(&b);
        assert_eq!(u, b.union(&a));
        assert_eq!(u.min, Vec3::new(-0.5, -2.5, -0.5));
        assert_eq!(u.max, Vec3::new(3.5, 0.5, 1.5));
    }

    #[test]
    fn test_reset_is_not_valid() {
        assert!(!AABB::reset().is_valid());
        assert!(unit_box_at(0.0, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_surface_area() {
        let b = AABB::new(Vec3::zeros(), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(b.surface_area(), 22.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let outer = AABB::new(Vec3::zeros(), Vec3::repeat(2.0));
        assert!(outer.contains(&outer));
        assert!(outer.contains(&AABB::new(Vec3::repeat(0.5), Vec3::repeat(2.0))));
        assert!(!outer.contains(&AABB::new(Vec3::repeat(0.5), Vec3::repeat(2.01))));
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = unit_box_at(0.0, 0.0, 0.0);
        let b = unit_box_at(1.0, 0.0, 0.0);
        assert!(a.intersects(&b));

        let c = unit_box_at(1.0 + 1.0e-4, 0.0, 0.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_touching_spheres_intersect() {
        let a = BoundingSphere::new(Vec3::zeros(), 1.0);
        let b = BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0);
        assert!(a.intersects(&b));

        let c = BoundingSphere::new(Vec3::new(2.0 + 1.0e-4, 0.0, 0.0), 1.0);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_sphere_box_touching_face() {
        let b = unit_box_at(0.0, 0.0, 0.0);
        let touching = BoundingSphere::new(Vec3::new(1.5, 0.0, 0.0), 1.0);
        assert!(b.intersects_sphere(&touching));

        let apart = BoundingSphere::new(Vec3::new(1.5 + 1.0e-3, 0.0, 0.0), 1.0);
        assert!(!b.intersects_sphere(&apart));
    }

    #[test]
    fn test_sphere_box_corner_uses_distance() {
        let b = unit_box_at(0.0, 0.0, 0.0);
        // Sphere near the corner: inside the expanded box but outside the rounded corner
        let s = BoundingSphere::new(Vec3::new(1.3, 1.3, 0.0), 1.0);
        assert!(!s.intersects_aabb(&b));
    }

    #[test]
    fn test_ray_slab_entry_distance() {
        let b = unit_box_at(5.0, 0.0, 0.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(b.intersect_ray(&ray).unwrap_or(-1.0), 4.5);

        let miss = Ray::new(Vec3::zeros(), Vec3::new(-1.0, 0.0, 0.0));
        assert!(b.intersect_ray(&miss).is_none());
    }
}

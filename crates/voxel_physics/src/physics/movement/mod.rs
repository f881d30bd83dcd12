//! Voxel collider movement
//!
//! Per-entity movement resolution against the voxel grid and the boxes of
//! dynamic bodies: gravity, sub-stepped sliding or swept moves, step
//! climbing, world clamping and stuck recovery. Everything here works on
//! plain component values; the ECS wiring lives in
//! `ecs::systems::voxel_collision_system`.

pub mod resolver;
pub mod step_climb;
pub mod stuck;

pub use resolver::{MoveOutcome, VoxelMovementResolver};
pub use step_climb::{try_step_climb, StepClimbRequest, StepClimbResult};
pub use stuck::{find_escape, StuckTracker};

use crate::foundation::math::Vec3;
use crate::physics::collision::AABB;
use crate::physics::voxel::grid::CONTACT_TOLERANCE;
use crate::physics::voxel::VoxelWorld;

/// Whether two boxes overlap by more than the contact tolerance on every axis.
///
/// Boxes resting against each other do not count.
pub fn overlaps_strictly(a: &AABB, b: &AABB) -> bool {
    (0..3).all(|axis| {
        a.max[axis] > b.min[axis] + CONTACT_TOLERANCE && a.min[axis] < b.max[axis] - CONTACT_TOLERANCE
    })
}

/// Static voxels plus the boxes of dynamic bodies, queried as one solid set
#[derive(Clone, Copy)]
pub struct Obstacles<'a> {
    /// Static voxel world
    pub world: &'a dyn VoxelWorld,
    /// World boxes of the dynamic bodies this frame
    pub bodies: &'a [AABB],
}

impl<'a> Obstacles<'a> {
    /// Bundle a voxel world with the current body boxes
    pub fn new(world: &'a dyn VoxelWorld, bodies: &'a [AABB]) -> Self {
        Self { world, bodies }
    }

    /// Whether `aabb` overlaps solid voxels
    pub fn voxels_overlap(&self, aabb: &AABB) -> bool {
        self.world.overlaps_aabb(aabb)
    }

    /// Whether `aabb` overlaps any dynamic body
    pub fn bodies_overlap(&self, aabb: &AABB) -> bool {
        self.bodies.iter().any(|body| overlaps_strictly(aabb, body))
    }

    /// Whether `aabb` overlaps anything solid
    pub fn is_blocked(&self, aabb: &AABB) -> bool {
        self.voxels_overlap(aabb) || self.bodies_overlap(aabb)
    }

    /// Whether a body top lies within `depth` below the box's feet
    pub fn bodies_support(&self, aabb: &AABB, depth: f32) -> bool {
        let mut slab = *aabb;
        slab.max.y = aabb.min.y;
        slab.min.y = aabb.min.y - depth;
        self.bodies_overlap(&slab)
    }

    /// Clip `displacement` so `aabb` stops at the faces of body boxes.
    ///
    /// Moves axis by axis, vertical first. Boxes the collider already
    /// overlaps are left to push-out. Returns the allowed displacement and
    /// the normal of the face that stopped it, preferring a vertical one.
    pub fn clip_to_bodies(&self, aabb: &AABB, displacement: Vec3) -> (Vec3, Option<Vec3>) {
        if self.bodies.is_empty() {
            return (displacement, None);
        }

        let mut current = *aabb;
        let mut allowed = Vec3::zeros();
        let mut normal: Option<Vec3> = None;
        for axis in [1, 0, 2] {
            let mut delta = displacement[axis];
            if delta == 0.0 {
                continue;
            }

            let mut hit = false;
            for body in self.bodies {
                let facing = (0..3).filter(|&a| a != axis).all(|a| {
                    current.max[a] > body.min[a] + CONTACT_TOLERANCE
                        && current.min[a] < body.max[a] - CONTACT_TOLERANCE
                });
                if !facing {
                    continue;
                }
                if delta > 0.0 && body.min[axis] >= current.max[axis] - CONTACT_TOLERANCE {
                    let gap = (body.min[axis] - current.max[axis]).max(0.0);
                    if gap < delta {
                        delta = gap;
                        hit = true;
                    }
                } else if delta < 0.0 && body.max[axis] <= current.min[axis] + CONTACT_TOLERANCE {
                    let gap = (current.min[axis] - body.max[axis]).max(0.0);
                    if gap < -delta {
                        delta = -gap;
                        hit = true;
                    }
                }
            }

            if hit {
                let mut face = Vec3::zeros();
                face[axis] = -displacement[axis].signum();
                if axis == 1 || normal.map_or(true, |n| n.y == 0.0) {
                    normal = Some(face);
                }
            }
            allowed[axis] = delta;
            let mut offset = Vec3::zeros();
            offset[axis] = delta;
            current = current.translated(offset);
        }
        (allowed, normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::IVec3;
    use crate::physics::voxel::VoxelGrid;
    use approx::assert_relative_eq;

    fn crate_box() -> AABB {
        AABB::new(Vec3::new(2.0, 0.0, -0.5), Vec3::new(3.0, 1.0, 0.5))
    }

    #[test]
    fn test_clip_stops_at_body_face() {
        let grid = VoxelGrid::new(Vec3::repeat(-8.0), IVec3::new(16, 16, 16), 1.0);
        let bodies = [crate_box()];
        let obstacles = Obstacles::new(&grid, &bodies);
        let walker = AABB::new(Vec3::new(0.0, 0.0, -0.3), Vec3::new(0.6, 1.0, 0.3));

        // Fast enough to jump over the whole crate in one move
        let (allowed, normal) = obstacles.clip_to_bodies(&walker, Vec3::new(5.0, 0.0, 0.2));
        assert_relative_eq!(allowed.x, 1.4, epsilon = 1.0e-5);
        assert_relative_eq!(allowed.z, 0.2);
        assert_eq!(normal, Some(Vec3::new(-1.0, 0.0, 0.0)));

        // Passing beside it is not clipped
        let beside = walker.translated(Vec3::new(0.0, 0.0, 2.0));
        let (allowed, normal) = obstacles.clip_to_bodies(&beside, Vec3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(allowed.x, 5.0);
        assert!(normal.is_none());
    }

    #[test]
    fn test_landing_on_body_reports_upward_normal() {
        let grid = VoxelGrid::new(Vec3::repeat(-8.0), IVec3::new(16, 16, 16), 1.0);
        let bodies = [crate_box()];
        let obstacles = Obstacles::new(&grid, &bodies);
        let falling = AABB::new(Vec3::new(2.2, 1.3, -0.3), Vec3::new(2.8, 2.3, 0.3));

        let (allowed, normal) = obstacles.clip_to_bodies(&falling, Vec3::new(0.1, -1.0, 0.0));
        assert_relative_eq!(allowed.y, -0.3, epsilon = 1.0e-5);
        assert_relative_eq!(allowed.x, 0.1);
        assert_eq!(normal, Some(Vec3::y()));

        let resting = falling.translated(allowed);
        assert!(obstacles.bodies_support(&resting, 0.05));
        assert!(!obstacles.bodies_support(&resting.translated(Vec3::new(0.0, 0.2, 0.0)), 0.05));
    }
}

//! Dynamic voxel body component
//!
//! Moving platforms and other kinematic movers made of voxels. Gameplay code
//! (or the platform motion driver) moves the transform; the body derives its
//! velocities from the per-frame delta.

use crate::ecs::Component;
use crate::foundation::math::{utils, IVec3, Quat, Vec3};
use crate::physics::collision::AABB;
use bitflags::bitflags;

bitflags! {
    /// Behaviour switches for a dynamic body
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BodyFlags: u8 {
        /// Entities standing on top ride along
        const PLATFORM = 1 << 0;
        /// Entities moving along the one-way direction pass through
        const ONE_WAY = 1 << 1;
        /// Overlapping entities are pushed out
        const PUSH_ENTITIES = 1 << 2;
        /// Riders are rotated with the body
        const CARRY_ROTATION = 1 << 3;
    }
}

/// Solid shape of a body
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape {
    /// A single box of `half_extents`
    Box,
    /// Individual voxel cells, cell `(0, 0, 0)` centered on the body position
    Cells(Vec<IVec3>),
}

/// Kinematic voxel body
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicVoxelBodyComponent {
    /// Solid shape
    pub shape: BodyShape,
    /// Half size in voxel units
    pub half_extents: Vec3,
    /// Edge length of one voxel
    pub voxel_size: f32,
    /// Behaviour switches
    pub flags: BodyFlags,
    /// Direction one-way bodies can be passed through in
    pub one_way_direction: Vec3,
    /// Linear velocity derived this frame
    pub velocity: Vec3,
    /// Linear velocity derived last frame
    pub previous_velocity: Vec3,
    /// Position seen this frame
    pub position: Vec3,
    /// Position seen last frame
    pub previous_position: Vec3,
    /// Rotation seen this frame
    pub rotation: Quat,
    /// Rotation seen last frame
    pub previous_rotation: Quat,
    /// Angular velocity (axis * rad/s) derived this frame
    pub angular_velocity: Vec3,
    initialized: bool,
}

impl Component for DynamicVoxelBodyComponent {}

impl DynamicVoxelBodyComponent {
    /// Box body with half extents given in voxel units
    pub fn new_box(half_extents: Vec3, voxel_size: f32) -> Self {
        Self {
            shape: BodyShape::Box,
            half_extents,
            voxel_size,
            flags: BodyFlags::PUSH_ENTITIES,
            one_way_direction: Vec3::y(),
            velocity: Vec3::zeros(),
            previous_velocity: Vec3::zeros(),
            position: Vec3::zeros(),
            previous_position: Vec3::zeros(),
            rotation: Quat::identity(),
            previous_rotation: Quat::identity(),
            angular_velocity: Vec3::zeros(),
            initialized: false,
        }
    }

    /// Body made of explicit voxel cells
    pub fn from_cells(cells: Vec<IVec3>, voxel_size: f32) -> Self {
        let mut half_extents = Vec3::zeros();
        for cell in &cells {
            for axis in 0..3 {
                half_extents[axis] = half_extents[axis].max(cell[axis].abs() as f32 + 0.5);
            }
        }
        Self {
            shape: BodyShape::Cells(cells),
            ..Self::new_box(half_extents, voxel_size)
        }
    }

    /// Builder pattern: Replace the flags
    pub fn with_flags(mut self, flags: BodyFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Builder pattern: Make this a rideable platform
    pub fn as_platform(mut self) -> Self {
        self.flags |= BodyFlags::PLATFORM;
        self
    }

    /// Builder pattern: Let entities moving along `direction` pass through
    pub fn one_way(mut self, direction: Vec3) -> Self {
        self.flags |= BodyFlags::ONE_WAY;
        self.one_way_direction = utils::safe_normalize(direction);
        self
    }

    /// Whether entities can ride this body
    pub fn is_platform(&self) -> bool {
        self.flags.contains(BodyFlags::PLATFORM)
    }

    /// Whether this body only blocks from one side
    pub fn is_one_way(&self) -> bool {
        self.flags.contains(BodyFlags::ONE_WAY)
    }

    /// Whether this body pushes overlapping entities out
    pub fn pushes_entities(&self) -> bool {
        self.flags.contains(BodyFlags::PUSH_ENTITIES)
    }

    /// Whether riders turn with this body
    pub fn carries_rotation(&self) -> bool {
        self.flags.contains(BodyFlags::CARRY_ROTATION)
    }

    /// Record this frame's transform and derive velocities from the delta.
    ///
    /// The first call only seeds the history, so a freshly spawned body does
    /// not report a jump from the origin.
    pub fn sync_from_transform(&mut self, position: Vec3, rotation: Quat, dt: f32) {
        if !self.initialized {
            self.position = position;
            self.previous_position = position;
            self.rotation = rotation;
            self.previous_rotation = rotation;
            self.velocity = Vec3::zeros();
            self.previous_velocity = Vec3::zeros();
            self.angular_velocity = Vec3::zeros();
            self.initialized = true;
            return;
        }

        self.previous_position = self.position;
        self.previous_rotation = self.rotation;
        self.previous_velocity = self.velocity;
        self.position = position;
        self.rotation = rotation;
        self.velocity = utils::velocity_from_delta(self.previous_position, position, dt);
        self.angular_velocity =
            utils::angular_velocity_from_delta(&self.previous_rotation, &rotation, dt);
    }

    /// Rotation applied between the previous and the current frame
    pub fn frame_rotation(&self) -> Quat {
        self.rotation * self.previous_rotation.inverse()
    }

    /// World-space bound of the whole body
    pub fn world_aabb(&self) -> AABB {
        Self::rotated_box(self.position, self.rotation, self.half_extents * self.voxel_size)
    }

    /// World-space boxes tested against entities, one per cell for cell bodies
    pub fn collision_boxes(&self) -> Vec<AABB> {
        match &self.shape {
            BodyShape::Box => vec![self.world_aabb()],
            BodyShape::Cells(cells) => {
                let half = Vec3::repeat(self.voxel_size * 0.5);
                cells
                    .iter()
                    .map(|cell| {
                        let local = Vec3::new(cell.x as f32, cell.y as f32, cell.z as f32)
                            * self.voxel_size;
                        Self::rotated_box(self.position + self.rotation * local, self.rotation, half)
                    })
                    .collect()
            }
        }
    }

    // Axis-aligned bound of a rotated box
    fn rotated_box(center: Vec3, rotation: Quat, half_extents: Vec3) -> AABB {
        let matrix = rotation.to_rotation_matrix();
        let abs = matrix.matrix().abs();
        AABB::from_center_half_extents(center, abs * half_extents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_first_sync_seeds_history() {
        let mut body = DynamicVoxelBodyComponent::new_box(Vec3::new(1.0, 0.5, 1.0), 1.0);
        body.sync_from_transform(Vec3::new(5.0, 0.0, 0.0), Quat::identity(), 0.1);
        assert_relative_eq!(body.velocity, Vec3::zeros());

        body.sync_from_transform(Vec3::new(5.5, 0.0, 0.0), Quat::identity(), 0.1);
        assert_relative_eq!(body.velocity, Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(body.previous_position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_angular_velocity_from_rotation_delta() {
        let mut body = DynamicVoxelBodyComponent::new_box(Vec3::new(1.0, 0.5, 1.0), 1.0);
        body.sync_from_transform(Vec3::zeros(), Quat::identity(), 0.5);
        let turned = Quat::from_axis_angle(&Vec3::y_axis(), 0.5);
        body.sync_from_transform(Vec3::zeros(), turned, 0.5);
        assert_relative_eq!(body.angular_velocity, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-4);

        // Zero dt yields no velocity rather than infinity
        body.sync_from_transform(Vec3::new(1.0, 0.0, 0.0), turned, 0.0);
        assert_relative_eq!(body.velocity, Vec3::zeros());
        assert_relative_eq!(body.angular_velocity, Vec3::zeros());
    }

    #[test]
    fn test_world_aabb_scales_by_voxel_size_and_rotation() {
        let mut body = DynamicVoxelBodyComponent::new_box(Vec3::new(2.0, 0.5, 1.0), 0.5);
        let quarter = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        body.sync_from_transform(Vec3::new(0.0, 1.0, 0.0), quarter, 0.1);
        let aabb = body.world_aabb();
        assert_relative_eq!(aabb.half_extents(), Vec3::new(0.5, 0.25, 1.0), epsilon = 1e-5);
        assert_relative_eq!(aabb.center(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_cell_bodies_report_one_box_per_cell() {
        let cells = vec![IVec3::new(0, 0, 0), IVec3::new(1, 0, 0), IVec3::new(-2, 1, 0)];
        let mut body = DynamicVoxelBodyComponent::from_cells(cells, 1.0).as_platform();
        assert_relative_eq!(body.half_extents, Vec3::new(2.5, 1.5, 0.5));
        body.sync_from_transform(Vec3::new(10.0, 0.0, 0.0), Quat::identity(), 0.1);

        let boxes = body.collision_boxes();
        assert_eq!(boxes.len(), 3);
        assert_relative_eq!(boxes[1].center(), Vec3::new(11.0, 0.0, 0.0));
        assert_relative_eq!(boxes[2].min, Vec3::new(7.5, 0.5, -0.5));
        assert!(body.is_platform() && body.pushes_entities() && !body.is_one_way());
    }
}

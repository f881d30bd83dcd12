//! Voxel collider component
//!
//! Marks an actor that moves through the voxel world under gravity. The box
//! is axis aligned and ignores the transform's rotation and scale.

use crate::ecs::Component;
use crate::foundation::math::Vec3;
use crate::physics::collision::AABB;

/// Per-entity step-climb limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClimbSettings {
    /// Climb ledges at all
    pub enabled: bool,
    /// Use one voxel as the maximum step height instead of `max_height`
    pub auto_height: bool,
    /// Highest ledge that can be climbed when `auto_height` is off
    pub max_height: f32,
    /// Extra forward distance added to the landing probe
    pub search_overshoot: f32,
    /// Shortest forward distance the landing probe moves
    pub min_step_depth: f32,
    /// Glide up to the landing over several frames instead of snapping
    pub smooth: bool,
    /// Speed of a smooth climb in units per second
    pub climb_speed: f32,
}

impl Default for StepClimbSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_height: true,
            max_height: 0.5,
            search_overshoot: 0.05,
            min_step_depth: 0.1,
            smooth: false,
            climb_speed: 4.0,
        }
    }
}

impl StepClimbSettings {
    /// Maximum step height for a world with the given voxel size
    pub fn effective_max_height(&self, voxel_size: f32) -> f32 {
        if self.auto_height {
            voxel_size
        } else {
            self.max_height
        }
    }
}

/// Axis-aligned collider resolved against the voxel grid each frame
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelColliderComponent {
    /// Half size of the box
    pub half_extents: Vec3,
    /// Box center relative to the transform position
    pub offset: Vec3,
    /// Standing on voxels or riding a platform
    pub grounded: bool,
    /// Vertical speed owned by the resolver (positive is up)
    pub vertical_velocity: f32,
    /// Multiplier applied to the configured gravity
    pub gravity_scale: f32,
    /// Terminal downward speed
    pub max_fall_speed: f32,
    /// Depth of the grounded probe below the feet
    pub ground_check_distance: f32,
    /// Slide along blocking surfaces instead of stopping at first contact
    pub sliding_enabled: bool,
    /// Surfaces slid along per sub-step
    pub max_slide_iterations: u32,
    /// Step-climb limits
    pub step_climb: StepClimbSettings,
    /// Transform position a smooth climb is heading to
    pub climb_target: Option<Vec3>,
    /// Normal of the last surface that blocked movement
    pub last_collision_normal: Option<Vec3>,
    /// Movement was blocked during the last frame
    pub was_colliding: bool,
}

impl Component for VoxelColliderComponent {}

impl Default for VoxelColliderComponent {
    fn default() -> Self {
        Self::new(Vec3::new(0.4, 0.9, 0.4))
    }
}

impl VoxelColliderComponent {
    /// Create a collider with the given half extents
    pub fn new(half_extents: Vec3) -> Self {
        Self {
            half_extents,
            offset: Vec3::zeros(),
            grounded: false,
            vertical_velocity: 0.0,
            gravity_scale: 1.0,
            max_fall_speed: 50.0,
            ground_check_distance: 0.05,
            sliding_enabled: true,
            max_slide_iterations: 3,
            step_climb: StepClimbSettings::default(),
            climb_target: None,
            last_collision_normal: None,
            was_colliding: false,
        }
    }

    /// Builder pattern: Set the center offset
    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Builder pattern: Set step-climb limits
    pub fn with_step_climb(mut self, settings: StepClimbSettings) -> Self {
        self.step_climb = settings;
        self
    }

    /// Builder pattern: Choose slide or sweep resolution
    pub fn with_sliding(mut self, enabled: bool) -> Self {
        self.sliding_enabled = enabled;
        self
    }

    /// Builder pattern: Set the gravity multiplier
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// World box for a transform at `position`
    pub fn aabb_at(&self, position: Vec3) -> AABB {
        AABB::from_center_half_extents(position + self.offset, self.half_extents)
    }

    /// Transform position whose box has the given minimum corner
    pub fn position_for_min(&self, min: Vec3) -> Vec3 {
        min + self.half_extents - self.offset
    }

    /// Whether a smooth climb is under way
    pub fn is_climbing(&self) -> bool {
        self.climb_target.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_follows_offset() {
        let collider = VoxelColliderComponent::new(Vec3::new(0.5, 1.0, 0.5))
            .with_offset(Vec3::new(0.0, 1.0, 0.0));
        let aabb = collider.aabb_at(Vec3::new(2.0, 0.0, 2.0));
        assert_relative_eq!(aabb.min, Vec3::new(1.5, 0.0, 1.5));
        assert_relative_eq!(aabb.max, Vec3::new(2.5, 2.0, 2.5));
        assert_relative_eq!(collider.position_for_min(aabb.min), Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_auto_step_height_uses_voxel_size() {
        let mut settings = StepClimbSettings::default();
        assert_eq!(settings.effective_max_height(0.25), 0.25);
        settings.auto_height = false;
        assert_eq!(settings.effective_max_height(0.25), 0.5);
    }
}

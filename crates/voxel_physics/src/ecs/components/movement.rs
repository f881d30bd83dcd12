//! Movement components for actors driven through the voxel world
//!
//! Gameplay code writes the desired velocity; the voxel collision system
//! reads its horizontal part and zeroes axes that were blocked this frame.

use crate::ecs::Component;
use crate::foundation::math::Vec3;

/// Component for entities that can move
#[derive(Debug, Clone, PartialEq)]
pub struct MovementComponent {
    /// Desired linear velocity in units per second.
    ///
    /// Only X and Z are integrated by the voxel resolver; vertical motion is
    /// owned by the collider's vertical velocity.
    pub velocity: Vec3,

    /// Whether movement is enabled
    pub enabled: bool,
}

impl MovementComponent {
    /// Create a new movement component
    pub fn new() -> Self {
        Self {
            velocity: Vec3::zeros(),
            enabled: true,
        }
    }

    /// Create a movement component with initial velocity
    pub fn with_velocity(velocity: Vec3) -> Self {
        Self {
            velocity,
            enabled: true,
        }
    }

    /// Set velocity
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    /// Enable or disable movement
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Velocity the resolver should integrate this frame
    pub fn effective_velocity(&self) -> Vec3 {
        if self.enabled {
            self.velocity
        } else {
            Vec3::zeros()
        }
    }
}

impl Component for MovementComponent {}

impl Default for MovementComponent {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker for entities currently attached to a ladder.
///
/// The ladder state machine lives in gameplay code; while this marker is
/// present the voxel collision system leaves the entity alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LadderClimbingComponent;

impl Component for LadderClimbingComponent {}

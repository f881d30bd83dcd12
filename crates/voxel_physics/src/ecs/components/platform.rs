//! Platform component
//!
//! Drives a dynamic voxel body along a [`PlatformMotion`], optionally spinning
//! it around its own center.

use crate::ecs::Component;
use crate::foundation::math::{utils, Quat, Unit, Vec3};
use crate::physics::platform_motion::PlatformMotion;

/// Constant spin around a fixed axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfRotation {
    /// Spin axis (normalized on use)
    pub axis: Vec3,
    /// Radians per second
    pub speed: f32,
}

impl SelfRotation {
    /// Rotation accumulated over `dt`, identity for a degenerate axis
    pub fn delta(&self, dt: f32) -> Quat {
        let axis = utils::safe_normalize(self.axis);
        if axis == Vec3::zeros() {
            return Quat::identity();
        }
        Quat::from_axis_angle(&Unit::new_unchecked(axis), self.speed * dt)
    }
}

/// Moving platform driven by the platform motion system
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformComponent {
    /// Identifier handed out by the platform motion system
    pub id: u32,
    /// Translation driver
    pub motion: PlatformMotion,
    /// Optional spin layered on top of the motion
    pub self_rotation: Option<SelfRotation>,
    /// Pause the platform without losing its progress
    pub active: bool,
}

impl Component for PlatformComponent {}

impl PlatformComponent {
    /// Create an active platform with the given motion
    pub fn new(motion: PlatformMotion) -> Self {
        Self {
            id: 0,
            motion,
            self_rotation: None,
            active: true,
        }
    }

    /// Builder pattern: Spin around `axis` at `speed` radians per second
    pub fn with_self_rotation(mut self, axis: Vec3, speed: f32) -> Self {
        self.self_rotation = Some(SelfRotation { axis, speed });
        self
    }
}

//! ECS Components module
//!
//! Plain data records attached to entities; the physics systems read and
//! write them.

pub mod collision;
pub mod dynamic_body;
pub mod movement;
pub mod platform;
pub mod transform;
pub mod voxel_collider;

pub use collision::{ColliderComponent, CollisionStateComponent};
pub use dynamic_body::{BodyFlags, BodyShape, DynamicVoxelBodyComponent};
pub use movement::{LadderClimbingComponent, MovementComponent};
pub use platform::{PlatformComponent, SelfRotation};
pub use transform::TransformComponent;
pub use voxel_collider::{StepClimbSettings, VoxelColliderComponent};

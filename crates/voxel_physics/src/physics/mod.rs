//! Physics module for collision detection and response
//!
//! Broad-phase detection over a dynamic BVH, movement of axis-aligned
//! colliders through a voxel world, and positional response against moving
//! voxel bodies and platforms.

pub mod collision;
pub mod collision_layers;
pub mod collision_system;
pub mod dynamic_body;
pub mod movement;
pub mod platform_motion;
pub mod platform_riding;
pub mod voxel;

pub use collision::{
    BoundingSphere,
    CollisionShape,
    Ray,
    SatResult,
    WorldSpaceShape,
    AABB,
};
pub use collision_layers::CollisionLayers;
pub use collision_system::{CollisionPair, PhysicsCollisionSystem};
pub use dynamic_body::{BodySnapshot, PushOut};
pub use movement::{MoveOutcome, StuckTracker, VoxelMovementResolver};
pub use platform_motion::{CircularMotion, LinearMotion, PlatformMotion};
pub use platform_riding::RiderTable;
pub use voxel::{VoxelGrid, VoxelWorld};
